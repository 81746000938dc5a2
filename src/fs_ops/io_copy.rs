//! Streaming copy into a new file.
//!
//! - The destination is created with `create_new(true)`: an existing file is
//!   never clobbered, even if it appeared after the caller's existence check.
//! - Buffered I/O with 1 MiB buffers; the destination is fsynced before return.
//! - A failed copy removes the partially written destination.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

const BUF_SIZE: usize = 1024 * 1024;

/// Copy `src` -> `dst` and return the number of bytes written.
pub(super) fn copy_new(src: &Path, dst: &Path) -> io::Result<u64> {
    let src_f = File::open(src)?;
    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        const FILE_FLAG_WRITE_THROUGH: u32 = 0x8000_0000;
        opts.custom_flags(FILE_FLAG_WRITE_THROUGH);
    }

    let dst_f = opts.open(dst)?;
    match stream(src_f, dst_f) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            let _ = fs::remove_file(dst);
            Err(e)
        }
    }
}

fn stream(src: File, dst: File) -> io::Result<u64> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, src);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(bytes)
}
