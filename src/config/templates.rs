//! Command → filename template lookup.
//!
//! The mapping is owned by the configuration layer; the engines only read
//! it. Templates may contain `{date}` (the reference date, `YYYY-MM-DD`) and
//! `{stem}` (the source file name without its extension).

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::types::Config;

/// Read-only lookup of a filename template by command name.
pub trait TemplateLookup {
    fn template_for(&self, command: &str) -> Option<&str>;
}

impl TemplateLookup for HashMap<String, String> {
    fn template_for(&self, command: &str) -> Option<&str> {
        self.get(command).map(String::as_str)
    }
}

impl TemplateLookup for BTreeMap<String, String> {
    fn template_for(&self, command: &str) -> Option<&str> {
        self.get(command).map(String::as_str)
    }
}

impl TemplateLookup for Config {
    fn template_for(&self, command: &str) -> Option<&str> {
        self.templates.template_for(command)
    }
}

/// No templates at all.
impl TemplateLookup for () {
    fn template_for(&self, _command: &str) -> Option<&str> {
        None
    }
}

/// Substitute `{date}` and `{stem}` placeholders.
pub fn expand_template(template: &str, stem: &str, date: NaiveDate) -> String {
    template
        .replace("{date}", &date.format("%Y-%m-%d").to_string())
        .replace("{stem}", stem)
}
