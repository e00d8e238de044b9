//! Currency balances.

use std::sync::Arc;

use idlewild_codec::{CodecError, FieldLadder, FieldStep, SaveDecoder, SaveEncoder};
use idlewild_types::{Currency, NamespacedId, Registries};

use crate::legacy::{LegacyResolver, LegacySave};
use crate::version::{MIN_SUPPORTED_VERSION, WALLET_LIFETIME_EARNED};

/// Local ID of the primary currency shown in save previews.
pub const PRIMARY_CURRENCY: &str = "gold";

/// Holdings of one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    /// The currency.
    pub currency: Arc<Currency>,
    /// Amount currently held.
    pub amount: u64,
    /// Total ever earned; spending does not reduce it.
    pub lifetime_earned: u64,
}

/// All currency balances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wallet {
    balances: Vec<Balance>,
}

impl Wallet {
    /// Create an empty wallet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balances in first-earned order.
    pub fn balances(&self) -> &[Balance] {
        &self.balances
    }

    /// Amount of `id` held.
    pub fn amount(&self, id: &NamespacedId) -> u64 {
        self.balances
            .iter()
            .find(|balance| balance.currency.id == *id)
            .map_or(0, |balance| balance.amount)
    }

    /// Amount of the primary currency held.
    pub fn primary_amount(&self) -> u64 {
        self.amount(&NamespacedId::base(PRIMARY_CURRENCY))
    }

    /// Credit `amount` of `currency`.
    pub fn earn(&mut self, currency: &Arc<Currency>, amount: u64) {
        if let Some(balance) = self
            .balances
            .iter_mut()
            .find(|balance| balance.currency.id == currency.id)
        {
            balance.amount = balance.amount.saturating_add(amount);
            balance.lifetime_earned = balance.lifetime_earned.saturating_add(amount);
            return;
        }
        self.balances.push(Balance {
            currency: Arc::clone(currency),
            amount,
            lifetime_earned: amount,
        });
    }

    /// Debit `amount` of `id`. Returns `false`, leaving the balance
    /// untouched, if not enough is held.
    pub fn spend(&mut self, id: &NamespacedId, amount: u64) -> bool {
        let Some(balance) = self.balances.iter_mut().find(|b| b.currency.id == *id) else {
            return amount == 0;
        };
        match balance.amount.checked_sub(amount) {
            Some(left) => {
                balance.amount = left;
                true
            }
            None => false,
        }
    }

    /// Write the current-version encoding.
    pub fn encode(&self, encoder: &mut SaveEncoder) -> Result<(), CodecError> {
        encoder.write_len(self.balances.len())?;
        for balance in &self.balances {
            encoder.write_ref(balance.currency.as_ref())?;
            encoder.write_u64(balance.amount);
            encoder.write_u64(balance.lifetime_earned);
        }
        Ok(())
    }

    /// Decode balances written at `decoder.version()`.
    ///
    /// Before `lifetime_earned` existed, it starts equal to the amount held.
    pub fn decode(decoder: &mut SaveDecoder<'_>, registries: &Registries) -> Result<Self, CodecError> {
        let mut wallet = Self::new();
        let count = decoder.read_len()?;
        for _ in 0..count {
            let mut draft = BalanceDraft::default();
            BALANCE_LADDER.apply(decoder, registries, &mut draft)?;
            if let Some(currency) = draft.currency {
                wallet.balances.push(Balance {
                    currency,
                    amount: draft.amount,
                    lifetime_earned: draft.lifetime_earned.unwrap_or(draft.amount),
                });
            }
        }
        Ok(wallet)
    }

    /// Build a wallet from the legacy gold balance.
    pub fn convert_legacy(legacy: &LegacySave, resolver: &mut LegacyResolver<'_>) -> Self {
        let registries = resolver.registries();
        let mut wallet = Self::new();
        if legacy.gp > 0 {
            let gold = NamespacedId::base(PRIMARY_CURRENCY);
            if let Some(currency) = resolver.resolve_id(&registries.currencies, gold) {
                wallet.earn(&currency, legacy.gp);
            }
        }
        wallet
    }
}

#[derive(Debug, Default)]
struct BalanceDraft {
    currency: Option<Arc<Currency>>,
    amount: u64,
    lifetime_earned: Option<u64>,
}

const BALANCE_STEPS: &[FieldStep<BalanceDraft, Registries>] = &[
    FieldStep::added(MIN_SUPPORTED_VERSION, "currency", read_currency),
    FieldStep::added(MIN_SUPPORTED_VERSION, "amount", read_amount),
    FieldStep::added(WALLET_LIFETIME_EARNED, "lifetime_earned", read_lifetime_earned),
];

const BALANCE_LADDER: FieldLadder<BalanceDraft, Registries> =
    FieldLadder::new("wallet.balance", BALANCE_STEPS);

fn read_currency(
    decoder: &mut SaveDecoder<'_>,
    registries: &Registries,
    draft: &mut BalanceDraft,
) -> Result<(), CodecError> {
    draft.currency = decoder.read_ref(&registries.currencies)?.resolved();
    Ok(())
}

fn read_amount(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    draft: &mut BalanceDraft,
) -> Result<(), CodecError> {
    draft.amount = decoder.read_u64()?;
    Ok(())
}

fn read_lifetime_earned(
    decoder: &mut SaveDecoder<'_>,
    _registries: &Registries,
    draft: &mut BalanceDraft,
) -> Result<(), CodecError> {
    draft.lifetime_earned = Some(decoder.read_u64()?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlewild_codec::SaveReader;

    use super::*;

    fn gold() -> Currency {
        Currency {
            id: NamespacedId::base(PRIMARY_CURRENCY),
            name: "Gold".to_owned(),
        }
    }

    #[test]
    fn earn_and_spend() {
        let gold = Arc::new(gold());
        let mut wallet = Wallet::new();
        wallet.earn(&gold, 100);
        assert!(wallet.spend(&gold.id, 30));
        assert!(!wallet.spend(&gold.id, 71));
        assert_eq!(wallet.primary_amount(), 70);
        assert_eq!(wallet.balances().first().map(|b| b.lifetime_earned), Some(100));
    }

    #[test]
    fn version_107_seeds_lifetime_from_amount() {
        let mut registries = Registries::new();
        let gold = registries.currencies.register(gold()).unwrap();

        let mut encoder = SaveEncoder::with_capacity(0);
        encoder.write_len(1).unwrap();
        encoder.write_ref(gold.as_ref()).unwrap();
        encoder.write_u64(55);
        let (manifest, body) = encoder.finish().unwrap();

        let mut decoder = SaveDecoder::new(SaveReader::new(&body), &manifest, 107);
        let wallet = Wallet::decode(&mut decoder, &registries).unwrap();
        assert!(decoder.is_exhausted());
        let balance = wallet.balances().first().unwrap();
        assert_eq!(balance.amount, 55);
        assert_eq!(balance.lifetime_earned, 55);
    }
}
