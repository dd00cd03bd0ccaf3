//! Loan shark - Credit line, borrowing, repayment and vig
//!
//! The credit cap is fixed for the day from the human's balance at the start
//! of that day. Vig compounds once per race on whatever is still owed.

use crate::race_engine::config::LoanTerms;
use crate::race_engine::player::Player;

/// Credit cap for the day, before subtracting what is already owed
pub fn credit_cap(day_start_balance: u64, terms: &LoanTerms) -> u64 {
    let scaled = (day_start_balance as f64 * terms.max_loan_factor).floor() as u64;
    terms.min_loan.max(scaled)
}

/// How much the player can still borrow today
pub fn max_loan_available(player: &Player, day_start_balance: u64, terms: &LoanTerms) -> u64 {
    credit_cap(day_start_balance, terms).saturating_sub(player.loan_balance)
}

/// Borrow `amount`. The caller clamps it to the available credit first.
pub fn take_loan(player: &Player, amount: u64) -> Player {
    Player {
        balance: player.balance + amount,
        loan_balance: player.loan_balance + amount,
        ..player.clone()
    }
}

/// Repay up to `amount`, never more than is owed or held
pub fn repay_loan(player: &Player, amount: u64) -> Player {
    let actual = amount.min(player.loan_balance).min(player.balance);
    Player {
        balance: player.balance - actual,
        loan_balance: player.loan_balance - actual,
        ..player.clone()
    }
}

/// Charge one race's vig on the outstanding balance, rounded up
pub fn accrue_vig(player: &Player, terms: &LoanTerms) -> Player {
    if player.loan_balance == 0 {
        return player.clone();
    }
    let vig = (player.loan_balance as f64 * terms.vig_rate).ceil() as u64;
    player.with_loan_balance(player.loan_balance + vig)
}

/// A player is bust once they hold nothing and the shark won't lend more
pub fn is_bust(player: &Player, day_start_balance: u64, terms: &LoanTerms) -> bool {
    player.balance == 0 && max_loan_available(player, day_start_balance, terms) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race_engine::player::create_player;

    fn player(balance: u64, loan_balance: u64) -> Player {
        create_player("Ada", true)
            .with_balance(balance)
            .with_loan_balance(loan_balance)
    }

    #[test]
    fn test_max_loan_available() {
        let terms = LoanTerms::default();
        assert_eq!(max_loan_available(&player(100, 20), 100, &terms), 30);
        assert_eq!(max_loan_available(&player(100, 0), 100, &terms), 50);
    }

    #[test]
    fn test_min_loan_floor() {
        let terms = LoanTerms::default();
        assert_eq!(max_loan_available(&player(0, 0), 4, &terms), 10);
        assert_eq!(max_loan_available(&player(0, 0), 0, &terms), 10);
    }

    #[test]
    fn test_max_loan_never_negative() {
        let terms = LoanTerms::default();
        assert_eq!(max_loan_available(&player(0, 80), 100, &terms), 0);
    }

    #[test]
    fn test_disabled_terms_lend_nothing() {
        let terms = LoanTerms::disabled();
        assert_eq!(max_loan_available(&player(0, 0), 1_000, &terms), 0);
        assert!(is_bust(&player(0, 0), 1_000, &terms));
    }

    #[test]
    fn test_take_loan() {
        let after = take_loan(&player(5, 10), 20);
        assert_eq!(after.balance, 25);
        assert_eq!(after.loan_balance, 30);
    }

    #[test]
    fn test_repay_is_clamped() {
        // Capped by the debt
        let after = repay_loan(&player(100, 30), 50);
        assert_eq!((after.balance, after.loan_balance), (70, 0));
        // Capped by the balance
        let after = repay_loan(&player(10, 30), 50);
        assert_eq!((after.balance, after.loan_balance), (0, 20));
        // Nothing owed
        let after = repay_loan(&player(10, 0), 5);
        assert_eq!((after.balance, after.loan_balance), (10, 0));
    }

    #[test]
    fn test_accrue_vig() {
        let terms = LoanTerms::default();
        assert_eq!(accrue_vig(&player(0, 40), &terms).loan_balance, 50);
        // ceil(3 * 0.25) = 1
        assert_eq!(accrue_vig(&player(0, 3), &terms).loan_balance, 4);
        let debt_free = player(7, 0);
        assert_eq!(accrue_vig(&debt_free, &terms), debt_free);
    }

    #[test]
    fn test_vig_compounds() {
        let terms = LoanTerms::default();
        let once = accrue_vig(&player(0, 40), &terms);
        let twice = accrue_vig(&once, &terms);
        assert_eq!(twice.loan_balance, 63);
    }

    #[test]
    fn test_bust() {
        let terms = LoanTerms::default();
        assert!(!is_bust(&player(0, 0), 100, &terms));
        assert!(is_bust(&player(0, 50), 100, &terms));
        assert!(!is_bust(&player(1, 50), 100, &terms));
    }
}
