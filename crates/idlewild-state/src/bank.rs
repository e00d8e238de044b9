//! Item storage.

use std::sync::Arc;

use idlewild_codec::{CodecError, FieldLadder, FieldStep, SaveDecoder, SaveEncoder};
use idlewild_types::{Item, NamespacedId, Registries};

use crate::error::StateError;
use crate::legacy::{LegacyBankEntry, LegacyResolver};
use crate::version::{BANK_DEFAULT_TAB_REMOVED, BANK_LOCKED_SLOTS, MIN_SUPPORTED_VERSION};

/// Distinct items the bank can hold.
pub const BANK_CAPACITY: usize = 200;

/// One stack of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankSlot {
    /// The item held.
    pub item: Arc<Item>,
    /// How many are held.
    pub quantity: u64,
    /// Locked slots are never sold or consumed automatically.
    pub locked: bool,
}

/// The player's bank, in slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bank {
    slots: Vec<BankSlot>,
}

impl Bank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots in display order.
    pub fn slots(&self) -> &[BankSlot] {
        &self.slots
    }

    /// Quantity of `id` held.
    pub fn quantity(&self, id: &NamespacedId) -> u64 {
        self.slot(id).map_or(0, |slot| slot.quantity)
    }

    fn slot(&self, id: &NamespacedId) -> Option<&BankSlot> {
        self.slots.iter().find(|slot| slot.item.id == *id)
    }

    /// Whether [`add`](Self::add) would accept `id`.
    pub fn can_store(&self, id: &NamespacedId) -> bool {
        self.slot(id).is_some() || self.slots.len() < BANK_CAPACITY
    }

    /// Add `quantity` of `item`, opening a new slot if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::BankFull`] if a new slot is needed and none is
    /// free.
    pub fn add(&mut self, item: &Arc<Item>, quantity: u64) -> Result<(), StateError> {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.item.id == item.id) {
            slot.quantity = slot.quantity.saturating_add(quantity);
            return Ok(());
        }
        if self.slots.len() >= BANK_CAPACITY {
            return Err(StateError::BankFull {
                item: item.id.clone(),
            });
        }
        self.slots.push(BankSlot {
            item: Arc::clone(item),
            quantity,
            locked: false,
        });
        Ok(())
    }

    /// Remove up to `quantity` of `id`, dropping the slot when it empties
    /// unless it is locked. Returns how many were removed.
    pub fn remove(&mut self, id: &NamespacedId, quantity: u64) -> u64 {
        let Some(position) = self.slots.iter().position(|slot| slot.item.id == *id) else {
            return 0;
        };
        let Some(slot) = self.slots.get_mut(position) else {
            return 0;
        };
        let removed = slot.quantity.min(quantity);
        slot.quantity = slot.quantity.saturating_sub(removed);
        if slot.quantity == 0 && !slot.locked {
            self.slots.remove(position);
        }
        removed
    }

    /// Lock or unlock the slot holding `id`. Returns whether it exists.
    pub fn set_locked(&mut self, id: &NamespacedId, locked: bool) -> bool {
        match self.slots.iter_mut().find(|slot| slot.item.id == *id) {
            Some(slot) => {
                slot.locked = locked;
                true
            }
            None => false,
        }
    }

    /// Write the current-version encoding.
    pub fn encode(&self, encoder: &mut SaveEncoder) -> Result<(), CodecError> {
        encoder.write_len(self.slots.len())?;
        for slot in &self.slots {
            encoder.write_ref(slot.item.as_ref())?;
            encoder.write_u64(slot.quantity);
            encoder.write_bool(slot.locked);
        }
        Ok(())
    }

    /// Decode a bank written at `decoder.version()`.
    ///
    /// Slots whose item no longer resolves are dropped.
    pub fn decode(decoder: &mut SaveDecoder<'_>, registries: &Registries) -> Result<Self, CodecError> {
        let mut bank = Self::new();
        BANK_LADDER.apply(decoder, registries, &mut bank)?;
        Ok(bank)
    }

    /// Build a bank from legacy entries.
    pub fn convert_legacy(entries: &[LegacyBankEntry], resolver: &mut LegacyResolver<'_>) -> Self {
        let registries = resolver.registries();
        let mut bank = Self::new();
        for entry in entries {
            if let Some(item) = resolver.resolve(&registries.items, entry.id) {
                if bank.slots.len() < BANK_CAPACITY {
                    bank.slots.push(BankSlot {
                        item,
                        quantity: entry.qty,
                        locked: false,
                    });
                }
            }
        }
        bank
    }
}

#[derive(Debug, Default)]
struct SlotDraft {
    item: Option<Arc<Item>>,
    quantity: u64,
    locked: bool,
}

const BANK_STEPS: &[FieldStep<Bank, Registries>] = &[
    FieldStep::removed(
        MIN_SUPPORTED_VERSION,
        BANK_DEFAULT_TAB_REMOVED,
        "default_tab",
        discard_default_tab,
    ),
    FieldStep::added(MIN_SUPPORTED_VERSION, "slots", read_slots),
];

const BANK_LADDER: FieldLadder<Bank, Registries> = FieldLadder::new("bank", BANK_STEPS);

const SLOT_STEPS: &[FieldStep<SlotDraft, Registries>] = &[
    FieldStep::added(MIN_SUPPORTED_VERSION, "item", read_slot_item),
    FieldStep::added(MIN_SUPPORTED_VERSION, "quantity", read_slot_quantity),
    FieldStep::added(BANK_LOCKED_SLOTS, "locked", read_slot_locked),
];

const SLOT_LADDER: FieldLadder<SlotDraft, Registries> = FieldLadder::new("bank.slot", SLOT_STEPS);

fn discard_default_tab(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    _bank: &mut Bank,
) -> Result<(), CodecError> {
    decoder.read_u8().map(|_tab| ())
}

fn read_slots(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    bank: &mut Bank,
) -> Result<(), CodecError> {
    let count = decoder.read_len()?;
    for _ in 0..count {
        let mut draft = SlotDraft::default();
        SLOT_LADDER.apply(decoder, registries, &mut draft)?;
        if let Some(item) = draft.item {
            bank.slots.push(BankSlot {
                item,
                quantity: draft.quantity,
                locked: draft.locked,
            });
        }
    }
    Ok(())
}

fn read_slot_item(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    draft: &mut SlotDraft,
) -> Result<(), CodecError> {
    draft.item = decoder.read_ref(&registries.items)?.resolved();
    Ok(())
}

fn read_slot_quantity(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    draft: &mut SlotDraft,
) -> Result<(), CodecError> {
    draft.quantity = decoder.read_u64()?;
    Ok(())
}

fn read_slot_locked(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    draft: &mut SlotDraft,
) -> Result<(), CodecError> {
    draft.locked = decoder.read_bool()?;
    Ok(())
}
