use anyhow::{bail, Result};

/// Nombre de positions d'un tirage pl5.
pub const POSITIONS: usize = 5;
/// Domaine des chiffres par position (0-9).
pub const DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub period: u32,
    pub date: String,
    pub digits: [u8; POSITIONS],
}

#[derive(Debug, Clone)]
pub struct DigitStats {
    pub digit: u8,
    pub frequency: u32,
    pub gap: u32,
}

pub fn validate_digits(digits: &[u8; POSITIONS]) -> Result<()> {
    for (pos, &d) in digits.iter().enumerate() {
        if d > 9 {
            bail!("Chiffre {} hors limites (0-9) en position {}", d, pos + 1);
        }
    }
    Ok(())
}
