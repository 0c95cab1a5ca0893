// Copyright 2023 the xcompose Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Small platform helpers: read-only file mapping and environment access.

use std::fs::File;
use std::io;
use std::ops::Deref;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        use std::os::raw::c_void;
        use std::os::unix::io::AsRawFd;
        use std::ptr::{self, NonNull};

        use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
    }
}

/// A read-only view of a whole file.
///
/// On unix the file is mapped into memory; if mapping fails (or the file
/// is empty, which `mmap` rejects) the contents are read onto the heap
/// instead, which is also the only path on other platforms.
pub(crate) struct FileMap {
    backing: Backing,
}

enum Backing {
    #[cfg(unix)]
    Map {
        ptr: NonNull<c_void>,
        size: usize,
    },
    Heap(Vec<u8>),
}

impl FileMap {
    /// Map `file` in its entirety, regardless of its current read position.
    pub(crate) fn new(file: &File) -> io::Result<FileMap> {
        #[cfg(unix)]
        {
            let size = file.metadata()?.len() as usize;
            if size > 0 {
                // Safety: we map the whole file read-only and unmap in Drop;
                // the fd only needs to stay open for the duration of the call.
                let result = unsafe {
                    mmap(
                        ptr::null_mut(),
                        size,
                        ProtFlags::PROT_READ,
                        MapFlags::MAP_PRIVATE,
                        file.as_raw_fd(),
                        0,
                    )
                };
                match result {
                    Ok(map) => {
                        return Ok(FileMap {
                            backing: Backing::Map {
                                ptr: NonNull::new(map).unwrap(),
                                size,
                            },
                        });
                    }
                    Err(err) => {
                        tracing::debug!("mmap failed ({err}), falling back to a plain read");
                    }
                }
            }
        }

        use std::io::{Read, Seek, SeekFrom};
        let mut file = file;
        file.seek(SeekFrom::Start(0))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(FileMap {
            backing: Backing::Heap(contents),
        })
    }
}

impl Deref for FileMap {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.backing {
            #[cfg(unix)]
            // Safety: the mapping is live until Drop and was created with
            // exactly this length.
            Backing::Map { ptr, size } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr() as *const u8, *size)
            },
            Backing::Heap(contents) => contents,
        }
    }
}

impl Drop for FileMap {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Backing::Map { ptr, size } = &self.backing {
            // Safety: ptr/size came from the successful mmap in `new`.
            if let Err(e) = unsafe { munmap(ptr.as_ptr(), *size) } {
                tracing::warn!("Error unmapping Compose file: {}", e);
            }
        }
    }
}

/// Read an environment variable, ignoring the environment entirely in
/// set-uid/set-gid processes (the usual `secure_getenv` rule, so a
/// privileged consumer can't be pointed at an attacker's Compose file).
///
/// Values that aren't valid UTF-8 are treated as unset.
pub(crate) fn secure_getenv(name: &str) -> Option<String> {
    #[cfg(unix)]
    {
        use nix::unistd::{getegid, geteuid, getgid, getuid};
        if getuid() != geteuid() || getgid() != getegid() {
            return None;
        }
    }
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn maps_file_contents() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"<a> <b> : \"x\"\n").unwrap();
        let map = FileMap::new(&file).unwrap();
        assert_eq!(&*map, b"<a> <b> : \"x\"\n");
    }

    #[test]
    fn empty_file_maps_empty() {
        let file = tempfile::tempfile().unwrap();
        let map = FileMap::new(&file).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn mapping_ignores_read_position() {
        use std::io::{Read, Seek, SeekFrom};
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"abcdef").unwrap();
        file.seek(SeekFrom::Start(3)).unwrap();
        let map = FileMap::new(&file).unwrap();
        assert_eq!(&*map, b"abcdef");
        // A heap fallback must not leave the caller's cursor somewhere odd
        // for its own read; the mapping itself never consumes the file.
        let mut rest = Vec::new();
        let mut f = &file;
        f.seek(SeekFrom::Start(3)).unwrap();
        f.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"def");
    }
}
