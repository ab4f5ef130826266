use std::sync::Arc;

use log::{debug, trace};

use crate::config;
use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::page_id::PageId;
use crate::transaction::TransactionId;
use crate::tuple::{RecordId, Tuple};

/// A fixed-size on-disk page: a header bitmap (LSB-first, slot `i` lives in
/// bit `i % 8` of byte `i / 8`) followed by `num_slots` fixed-width tuple
/// regions. Holds a before-image snapshot so an aborting transaction can be
/// rolled back without re-reading from disk.
pub struct HeapPage {
    id: PageId,
    desc: Arc<TupleDesc>,
    header: Vec<u8>,
    slots: Vec<Option<Tuple>>,
    dirty: Option<TransactionId>,
    before_image: Vec<u8>,
}

impl HeapPage {
    /// Number of tuple slots a page with this schema can hold, derived from
    /// the process-wide page size: `floor(pageSize*8 / (tupleSize*8 + 1))`.
    pub fn num_slots(desc: &TupleDesc) -> usize {
        let tuple_bits = desc.size() * 8;
        (config::page_size() * 8) / (tuple_bits + 1)
    }

    pub fn header_len(desc: &TupleDesc) -> usize {
        (Self::num_slots(desc) + 7) / 8
    }

    pub fn new(id: PageId, desc: Arc<TupleDesc>, bytes: &[u8]) -> DbResult<Self> {
        if bytes.len() < config::page_size() {
            return Err(DbError::PageReadError(format!(
                "short page read for {id}: got {} bytes, want {}",
                bytes.len(),
                config::page_size()
            )));
        }

        let num_slots = Self::num_slots(&desc);
        let header_len = Self::header_len(&desc);
        let header = bytes[..header_len].to_vec();

        let tuple_size = desc.size();
        let mut slots = Vec::with_capacity(num_slots);
        let mut offset = header_len;
        for slot in 0..num_slots {
            let region = &bytes[offset..offset + tuple_size];
            if Self::bit_set(&header, slot) {
                let mut t = Tuple::new(Arc::clone(&desc));
                let mut field_offset = 0;
                for i in 0..desc.len() {
                    let field_type = desc.field_type(i)?;
                    let field = field_type.parse(&region[field_offset..])?;
                    t.set_field(i, field)?;
                    field_offset += field_type.size();
                }
                t.set_record_id(RecordId::new(id, slot));
                slots.push(Some(t));
            } else {
                slots.push(None);
            }
            offset += tuple_size;
        }

        trace!(
            "parsed page {id}: {} slots, {} used",
            num_slots,
            slots.iter().filter(|s| s.is_some()).count()
        );

        let before_image = bytes[..config::page_size()].to_vec();
        Ok(Self {
            id,
            desc,
            header,
            slots,
            dirty: None,
            before_image,
        })
    }

    /// An empty page of this schema, as it would look freshly appended to a
    /// heap file.
    pub fn empty(id: PageId, desc: Arc<TupleDesc>) -> Self {
        let header_len = Self::header_len(&desc);
        let num_slots = Self::num_slots(&desc);
        let bytes = vec![0u8; config::page_size()];
        Self {
            id,
            before_image: bytes,
            header: vec![0u8; header_len],
            slots: vec![None; num_slots],
            dirty: None,
            desc,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn tuple_desc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.desc)
    }

    fn bit_set(header: &[u8], slot: usize) -> bool {
        (header[slot / 8] >> (slot % 8)) & 1 == 1
    }

    fn set_bit(header: &mut [u8], slot: usize, value: bool) {
        if value {
            header[slot / 8] |= 1 << (slot % 8);
        } else {
            header[slot / 8] &= !(1 << (slot % 8));
        }
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        Self::bit_set(&self.header, slot)
    }

    pub fn num_slots_total(&self) -> usize {
        self.slots.len()
    }

    pub fn num_empty_slots(&self) -> usize {
        let used: usize = self
            .header
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum();
        self.slots.len() - used
    }

    /// Serializes the page to exactly `page_size()` bytes: header, then
    /// every slot region (zero-filled if empty), then zero padding.
    /// `HeapPage::new(id, p.page_data()).page_data() == p.page_data()` for
    /// any page `p`.
    pub fn page_data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(config::page_size());
        out.extend_from_slice(&self.header);

        let tuple_size = self.desc.size();
        for slot in &self.slots {
            match slot {
                Some(t) => out.extend(t.to_bytes()),
                None => out.extend(std::iter::repeat(0u8).take(tuple_size)),
            }
        }

        out.resize(config::page_size(), 0);
        out
    }

    fn find_empty_slot(&self) -> Option<usize> {
        (0..self.slots.len()).find(|&slot| !self.is_slot_used(slot))
    }

    pub fn insert_tuple(&mut self, mut t: Tuple) -> DbResult<()> {
        if t.desc() != self.desc.as_ref() {
            return Err(DbError::SchemaMismatch(format!(
                "tuple schema {} does not match page schema {}",
                t.desc(),
                self.desc
            )));
        }
        let slot = self.find_empty_slot().ok_or(DbError::NoEmptySlots)?;
        t.set_record_id(RecordId::new(self.id, slot));
        Self::set_bit(&mut self.header, slot, true);
        self.slots[slot] = Some(t);
        debug!("inserted tuple into {} slot {slot}", self.id);
        Ok(())
    }

    pub fn delete_tuple(&mut self, t: &Tuple) -> DbResult<()> {
        let rid = t.record_id().ok_or(DbError::NotOnPage)?;
        if rid.page_id != self.id {
            return Err(DbError::NotOnPage);
        }
        if !self.is_slot_used(rid.slot) {
            return Err(DbError::EmptySlot);
        }
        let stored = self.slots[rid.slot].as_ref().ok_or(DbError::EmptySlot)?;
        if stored != t {
            return Err(DbError::NotOnPage);
        }
        Self::set_bit(&mut self.header, rid.slot, false);
        debug!("deleted tuple from {} slot {}", self.id, rid.slot);
        Ok(())
    }

    pub fn mark_dirty(&mut self, dirty: bool, tid: Option<TransactionId>) {
        self.dirty = if dirty { tid } else { None };
    }

    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty
    }

    /// Tuples of used slots, in ascending slot order. Re-callable: each
    /// call walks the live slot array fresh, so it is finite and
    /// restartable by construction.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Snapshots the page's current on-disk representation as the
    /// before-image used by a future abort. Called once at construction and
    /// again after every successful commit-time flush, so that the
    /// before-image always reflects the last *committed* state rather than
    /// whatever a page happened to look like when it entered the cache.
    pub fn set_before_image(&mut self) {
        self.before_image = self.page_data();
    }

    /// Reconstructs the page as it looked at the last `set_before_image`
    /// call.
    pub fn before_image(&self) -> DbResult<HeapPage> {
        HeapPage::new(self.id, Arc::clone(&self.desc), &self.before_image)
    }
}
