use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use log::{debug, error};

use crate::error::DbError;

pub const PAGE_SIZE: usize = 4096;
pub const MAX_PAGES: usize = 100;

pub type Page = Vec<u8>;

/// Owns the database file handle and a fixed-size array of page slots.
/// Pages are read on demand and released only at `close`; there is no
/// eviction, so at most one cached copy of each page ever exists.
pub struct Pager {
    file: File,
    file_length: u64,
    num_pages: usize,
    pages: Vec<Option<Page>>,
}

impl Pager {
    pub fn open(filename: &str) -> Result<Pager, DbError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(filename)
            .map_err(|source| DbError::Open {
                path: filename.to_string(),
                source,
            })?;
        let file_length = file.metadata()?.len();

        if file_length % PAGE_SIZE as u64 != 0 {
            error!(
                "database file {} has length {} which is not a multiple of PAGE_SIZE {}",
                filename, file_length, PAGE_SIZE
            );
            return Err(DbError::CorruptFile);
        }

        let num_pages = (file_length / PAGE_SIZE as u64) as usize;
        debug!("opened {} with {} existing page(s)", filename, num_pages);

        Ok(Pager {
            file,
            file_length,
            num_pages,
            pages: (0..MAX_PAGES).map(|_| None).collect(),
        })
    }

    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    /// The next unused page number. The caller must `get` it to actually
    /// extend `num_pages` and then initialize it as leaf or internal.
    pub fn allocate_new_page_number(&self) -> u32 {
        self.num_pages as u32
    }

    /// Returns a mutable view of the page, loading it from disk on first
    /// access and zero-filling any bytes past the on-disk extent.
    pub fn get(&mut self, page_num: usize) -> Result<&mut Page, DbError> {
        if page_num >= MAX_PAGES {
            error!("page {} is out of bounds (max {})", page_num, MAX_PAGES);
            return Err(DbError::PageOutOfBounds(page_num, MAX_PAGES));
        }

        if self.pages[page_num].is_none() {
            let mut buf = vec![0u8; PAGE_SIZE];
            if (page_num as u64) < self.file_length / PAGE_SIZE as u64 {
                self.file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
                // An incomplete read at EOF is fine: the rest of `buf`
                // stays zeroed.
                let mut remaining = &mut buf[..];
                while !remaining.is_empty() {
                    match self.file.read(remaining)? {
                        0 => break,
                        n => remaining = &mut remaining[n..],
                    }
                }
            }
            self.pages[page_num] = Some(buf);
            if page_num >= self.num_pages {
                self.num_pages = page_num + 1;
            }
        }

        Ok(self.pages[page_num].as_mut().unwrap())
    }

    /// Writes a full `PAGE_SIZE` page back to disk. Never writes a
    /// partial tail.
    pub fn flush(&mut self, page_num: usize) -> Result<(), DbError> {
        match &self.pages[page_num] {
            None => {
                error!("attempted to flush empty slot {}", page_num);
                Err(DbError::FlushEmptySlot)
            }
            Some(page) => {
                self.file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
                self.file.write_all(page)?;
                if (page_num as u64 + 1) * PAGE_SIZE as u64 > self.file_length {
                    self.file_length = (page_num as u64 + 1) * PAGE_SIZE as u64;
                }
                Ok(())
            }
        }
    }

    /// Flushes every populated slot and releases the buffers. The file
    /// descriptor closes when `Pager` is dropped.
    pub fn close(&mut self) -> Result<(), DbError> {
        for page_num in 0..self.num_pages {
            if self.pages[page_num].is_some() {
                self.flush(page_num)?;
            }
        }
        self.file.flush()?;
        Ok(())
    }
}
