use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::config;
use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::heap_page::HeapPage;
use crate::page_id::PageId;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;
use crate::util::table_id_from_path;

/// An on-disk table: a flat sequence of fixed-size pages under one path.
/// `HeapFile` only knows how to read/write pages and grow the file — it has
/// no reference back to the `BufferPool` that caches its pages (that would
/// be a reference cycle). Callers that need cache-aware pinning (insert,
/// delete) supply it as a closure.
pub struct HeapFile {
    path: PathBuf,
    desc: Arc<TupleDesc>,
    id: i64,
    file: Mutex<File>,
}

impl HeapFile {
    pub fn new<P: AsRef<Path>>(path: P, desc: Arc<TupleDesc>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| DbError::PageReadError(format!("cannot open {}: {e}", path.display())))?;
        let id = table_id_from_path(&path)?;
        Ok(Self {
            path,
            desc,
            id,
            file: Mutex::new(file),
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tuple_desc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.desc)
    }

    pub fn num_pages(&self) -> DbResult<usize> {
        let file = self.file.lock().unwrap();
        let len = file
            .metadata()
            .map_err(|e| DbError::PageReadError(e.to_string()))?
            .len() as usize;
        Ok((len + config::page_size() - 1) / config::page_size())
    }

    pub fn read_page(&self, page_no: usize) -> DbResult<HeapPage> {
        let mut file = self.file.lock().unwrap();
        let offset = (page_no * config::page_size()) as u64;
        file.seek(SeekFrom::Start(offset)).map_err(|e| {
            warn!("seek to page {page_no} failed in {}: {e}", self.path.display());
            DbError::PageReadError(e.to_string())
        })?;
        let mut buf = vec![0u8; config::page_size()];
        file.read_exact(&mut buf).map_err(|e| {
            warn!("short read at page {page_no} in {}: {e}", self.path.display());
            DbError::PageReadError(format!("short read at page {page_no}: {e}"))
        })?;
        let pid = PageId::new(self.id, page_no);
        debug!("read page {pid} from {}", self.path.display());
        HeapPage::new(pid, Arc::clone(&self.desc), &buf)
    }

    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let mut file = self.file.lock().unwrap();
        let offset = (page.id().page_no * config::page_size()) as u64;
        file.seek(SeekFrom::Start(offset)).map_err(|e| {
            warn!("seek to page {} failed in {}: {e}", page.id(), self.path.display());
            DbError::PageWriteError(e.to_string())
        })?;
        file.write_all(&page.page_data()).map_err(|e| {
            warn!("write failed for page {} in {}: {e}", page.id(), self.path.display());
            DbError::PageWriteError(e.to_string())
        })?;
        debug!("wrote page {} to {}", page.id(), self.path.display());
        Ok(())
    }

    /// Appends one fresh empty page, atomically growing the file by exactly
    /// `page_size()` bytes. Returns the new page's page number.
    pub fn append_empty_page(&self) -> DbResult<usize> {
        let page_no = self.num_pages()?;
        let empty = HeapPage::empty(PageId::new(self.id, page_no), Arc::clone(&self.desc));
        self.write_page(&empty)?;
        Ok(page_no)
    }

    /// Scans pages `0..num_pages`, asking `get_page` (typically
    /// `BufferPool::get_page` bound to a transaction and write permission)
    /// to pin each one, and inserts into the first page with room. Appends
    /// a new page if every existing page is full. Returns every page that
    /// was modified.
    pub fn insert_tuple<F>(
        &self,
        tid: TransactionId,
        mut get_page: F,
        t: Tuple,
    ) -> DbResult<Vec<PageId>>
    where
        F: FnMut(PageId) -> DbResult<Arc<Mutex<HeapPage>>>,
    {
        let num_pages = self.num_pages()?;
        for page_no in 0..num_pages {
            let pid = PageId::new(self.id, page_no);
            let page_arc = get_page(pid)?;
            let mut page = page_arc.lock().unwrap();
            match page.insert_tuple(t.clone()) {
                Ok(()) => {
                    page.mark_dirty(true, Some(tid));
                    return Ok(vec![pid]);
                }
                Err(DbError::NoEmptySlots) => continue,
                Err(e) => return Err(e),
            }
        }

        let page_no = self.append_empty_page()?;
        let pid = PageId::new(self.id, page_no);
        let page_arc = get_page(pid)?;
        let mut page = page_arc.lock().unwrap();
        page.insert_tuple(t)?;
        page.mark_dirty(true, Some(tid));
        Ok(vec![pid])
    }

    pub fn delete_tuple<F>(&self, tid: TransactionId, mut get_page: F, t: &Tuple) -> DbResult<PageId>
    where
        F: FnMut(PageId) -> DbResult<Arc<Mutex<HeapPage>>>,
    {
        let rid = t.record_id().ok_or(DbError::NotOnPage)?;
        let page_arc = get_page(rid.page_id)?;
        let mut page = page_arc.lock().unwrap();
        page.delete_tuple(t)?;
        page.mark_dirty(true, Some(tid));
        Ok(rid.page_id)
    }
}

/// Lazily pages through `0..num_pages`, pinning one page at a time through
/// the supplied `get_page` closure in read mode, and replaying its tuples.
/// Holds no long-lived borrow of the page lock: each page's tuples are
/// materialized into an owned `Vec` before the lock is dropped, so the
/// iterator itself is `'static`-free of lock guards.
pub struct HeapFileIterator<F>
where
    F: FnMut(usize) -> DbResult<Arc<Mutex<HeapPage>>>,
{
    get_page: F,
    num_pages: usize,
    page_no: usize,
    buffered: std::vec::IntoIter<Tuple>,
    started: bool,
}

impl<F> HeapFileIterator<F>
where
    F: FnMut(usize) -> DbResult<Arc<Mutex<HeapPage>>>,
{
    pub fn new(num_pages: usize, get_page: F) -> Self {
        Self {
            get_page,
            num_pages,
            page_no: 0,
            buffered: Vec::new().into_iter(),
            started: false,
        }
    }

    fn load_page(&mut self, page_no: usize) -> DbResult<()> {
        let page_arc = (self.get_page)(page_no)?;
        let page = page_arc.lock().unwrap();
        let tuples: Vec<Tuple> = page.iter().cloned().collect();
        self.buffered = tuples.into_iter();
        Ok(())
    }

    pub fn rewind(&mut self) -> DbResult<()> {
        self.page_no = 0;
        self.started = false;
        self.buffered = Vec::new().into_iter();
        Ok(())
    }

    pub fn next(&mut self) -> DbResult<Option<Tuple>> {
        loop {
            if !self.started {
                if self.page_no >= self.num_pages {
                    return Ok(None);
                }
                self.load_page(self.page_no)?;
                self.started = true;
            }
            if let Some(t) = self.buffered.next() {
                return Ok(Some(t));
            }
            self.page_no += 1;
            self.started = false;
            if self.page_no >= self.num_pages {
                return Ok(None);
            }
        }
    }
}
