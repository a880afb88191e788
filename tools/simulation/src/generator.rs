//! Seeded random scenario generator
//!
//! Produces a mix of deposits, extractions, balance reads and bare value
//! transfers over a fixed wallet set. Amount ranges straddle the ledger
//! limits so every rejection reason shows up in long runs.

use ledger_types::ids::WalletId;
use ledger_types::numeric::Amount;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use vault_ledger::abi::Message;
use vault_ledger::config::LedgerConfig;

use crate::scenario::{Scenario, Step};

/// Configuration for the random caller population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of distinct wallets
    pub wallets: usize,
    /// Number of wallets (from the end of the set) whose payouts bounce
    pub rejecting_wallets: usize,
    /// Relative weight of `depositToAccount`
    pub deposit_weight: u32,
    /// Relative weight of `extractFromAccount`
    pub extract_weight: u32,
    /// Relative weight of `getBalance`
    pub balance_weight: u32,
    /// Relative weight of bare value transfers
    pub receive_weight: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            wallets: 8,
            rejecting_wallets: 1,
            deposit_weight: 45,
            extract_weight: 40,
            balance_weight: 10,
            receive_weight: 5,
        }
    }
}

/// Random scenario generator with deterministic seeded RNG.
pub struct ScenarioGenerator {
    pub config: GeneratorConfig,
    ledger_config: LedgerConfig,
    wallets: Vec<WalletId>,
    rng: ChaCha8Rng,
}

impl ScenarioGenerator {
    /// Create a new generator with a deterministic seed.
    pub fn new(config: GeneratorConfig, ledger_config: LedgerConfig, seed: u64) -> Self {
        let wallets = (0..config.wallets.max(1))
            .map(|i| WalletId::new(format!("0x{:040x}", i + 1)))
            .collect();
        Self {
            config,
            ledger_config,
            wallets,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn wallets(&self) -> &[WalletId] {
        &self.wallets
    }

    /// Generate a single random step.
    pub fn generate_step(&mut self) -> Step {
        let caller = self.wallets[self.rng.gen_range(0..self.wallets.len())].clone();

        let deposit = self.config.deposit_weight;
        let extract = deposit + self.config.extract_weight;
        let balance = extract + self.config.balance_weight;
        let total = (balance + self.config.receive_weight).max(1);
        let roll = self.rng.gen_range(0..total);

        let message = if roll < deposit {
            Message::DepositToAccount {
                value: self.deposit_value(),
            }
        } else if roll < extract {
            Message::ExtractFromAccount {
                quantity: self.extract_quantity(),
            }
        } else if roll < balance {
            Message::GetBalance
        } else {
            Message::Receive {
                value: Amount::new(self.rng.gen_range(1..=100)),
            }
        };

        Step::new(caller, message)
    }

    /// Generate a complete scenario of `steps` calls.
    pub fn generate(&mut self, steps: usize) -> Scenario {
        let rejecting = self.config.rejecting_wallets.min(self.wallets.len());
        let mut scenario = Scenario::new(self.ledger_config);
        scenario.rejecting_wallets = self.wallets[self.wallets.len() - rejecting..].to_vec();
        scenario.steps = (0..steps).map(|_| self.generate_step()).collect();
        scenario
    }

    // Occasionally zero; otherwise up to 1/10 of the cap so the cap is reached mid-run.
    fn deposit_value(&mut self) -> Amount {
        if self.rng.gen_bool(0.05) {
            return Amount::ZERO;
        }
        let upper = (self.ledger_config.bank_cap.get() / 10).max(1);
        Amount::new(self.rng.gen_range(1..=upper))
    }

    // Up to 1.5x the per-call ceiling.
    fn extract_quantity(&mut self) -> Amount {
        let max = self.ledger_config.max_extract.get();
        let upper = max.saturating_add(max / 2).max(1);
        Amount::new(self.rng.gen_range(0..=upper))
    }
}
