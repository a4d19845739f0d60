//! Iron Bank loans owed by the player's house

use serde::{Deserialize, Serialize};

use crate::aggregate::world::WorldState;
use crate::core::calendar::AbsTurn;
use crate::core::config::config;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankDebt {
    pub principal: i64,
    pub interest_rate: f64,
    pub next_payment_turn: AbsTurn,
    pub minimum_payment: i64,
    #[serde(default)]
    pub missed_payments: u32,
}

/// Amounts the bank will lend
pub const LOAN_AMOUNTS: [i64; 3] = [300, 600, 1000];

/// What happened on a scheduled payment turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid { amount: i64, settled: bool },
    Missed { missed: u32, penalized: bool },
}

pub fn take_loan(world: &mut WorldState, amount: i64) -> std::result::Result<(), String> {
    if world.debt.is_some() {
        return Err("The Iron Bank will not lend again until your debt is repaid.".into());
    }
    if amount <= 0 {
        return Err("The bank does not deal in empty purses.".into());
    }
    let cfg = config();
    let now = world.now();
    let house = world
        .player_house_mut()
        .ok_or_else(|| "You have no house to pledge.".to_string())?;
    house.resources.gold += amount;
    house.adjust_prestige(-((amount + 349) / 350) as i32);

    let minimum = (amount as f64 * cfg.loan_min_payment_rate).round() as i64;
    world.debt = Some(BankDebt {
        principal: amount,
        interest_rate: cfg.loan_interest_rate,
        next_payment_turn: now + cfg.loan_term,
        minimum_payment: minimum,
        missed_payments: 0,
    });
    tracing::debug!(amount, minimum, "Loan taken");
    world.narrate(format!(
        "The Iron Bank lends you {} gold. Minimum payment {} every {} turns.",
        amount, minimum, cfg.loan_term
    ));
    Ok(())
}

/// Pays one minimum installment; the principal shrinks by 60% of it
fn pay_installment(world: &mut WorldState) -> Option<(i64, bool)> {
    let debt = world.debt.clone()?;
    let house = world.player_house_mut()?;
    if house.resources.gold < debt.minimum_payment {
        return None;
    }
    house.resources.gold -= debt.minimum_payment;
    let amortized = (debt.minimum_payment as f64 * 0.6).round() as i64;
    let principal = (debt.principal - amortized).max(0);
    if principal == 0 {
        house.adjust_prestige(1);
        world.debt = None;
        return Some((debt.minimum_payment, true));
    }
    if let Some(d) = world.debt.as_mut() {
        d.principal = principal;
        d.missed_payments = d.missed_payments.saturating_sub(1);
    }
    Some((debt.minimum_payment, false))
}

/// Pays the minimum ahead of schedule
pub fn pay_minimum(world: &mut WorldState) -> std::result::Result<i64, String> {
    if world.debt.is_none() {
        return Err("You owe the Iron Bank nothing.".into());
    }
    let (paid, settled) = pay_installment(world).ok_or_else(|| "Not enough gold for the minimum payment.".to_string())?;
    if settled {
        world.narrate("The last installment is paid. The Iron Bank is satisfied.");
    } else {
        world.narrate(format!("You pay the Iron Bank {} gold.", paid));
    }
    Ok(paid)
}

/// Clears the whole remaining principal
pub fn pay_all(world: &mut WorldState) -> std::result::Result<i64, String> {
    let principal = world
        .debt
        .as_ref()
        .map(|d| d.principal)
        .ok_or_else(|| "You owe the Iron Bank nothing.".to_string())?;
    let house = world
        .player_house_mut()
        .ok_or_else(|| "You have no house treasury.".to_string())?;
    if house.resources.gold < principal {
        return Err(format!("Repaying the loan needs {} gold.", principal));
    }
    house.resources.gold -= principal;
    house.adjust_prestige(1);
    world.debt = None;
    world.narrate(format!("You repay the Iron Bank in full: {} gold.", principal));
    Ok(principal)
}

/// Collects a scheduled payment when it falls due
pub fn tick_loans(world: &mut WorldState) -> Option<PaymentOutcome> {
    let now = world.now();
    let due = world.debt.as_ref().map_or(false, |d| now >= d.next_payment_turn);
    if !due {
        return None;
    }
    let cfg = config();

    if let Some((amount, settled)) = pay_installment(world) {
        if let Some(d) = world.debt.as_mut() {
            d.next_payment_turn += cfg.loan_term;
        }
        world.narrate(format!("The Iron Bank collects {} gold.", amount));
        return Some(PaymentOutcome::Paid { amount, settled });
    }

    let missed = {
        let d = world.debt.as_mut()?;
        d.missed_payments += 1;
        d.next_payment_turn += cfg.loan_grace;
        d.missed_payments
    };
    let penalized = missed >= cfg.loan_missed_limit;
    if penalized {
        if let Some(h) = world.player_house_mut() {
            h.adjust_prestige(-5);
            h.resources.take_gold(120);
        }
        tracing::info!(missed, "Iron Bank penalty applied");
        world.narrate("The Iron Bank sends its collectors. Prestige -5, gold -120.");
    } else {
        world.narrate(format!("You miss a payment to the Iron Bank ({} missed).", missed));
    }
    Some(PaymentOutcome::Missed { missed, penalized })
}
