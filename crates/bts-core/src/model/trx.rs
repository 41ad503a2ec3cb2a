// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The TRX (radio carrier) entity (spec.md §3).

use super::timeslot::Timeslot;
use super::TIMESLOTS_PER_TRX;
use crate::error::{Error, Result};
use crate::oml::mo::AdminOpState;

/// One radio carrier: an ARFCN, a nominal/max power budget and eight
/// timeslots.
#[derive(Debug)]
pub struct Trx {
    pub index: u8,
    pub arfcn: u16,
    pub nominal_power_dbm: i16,
    pub max_attenuation_db: u8,
    pub timeslots: Vec<Timeslot>,
    pub admin_state: AdminOpState,
}

impl Trx {
    /// Build a TRX with all eight timeslots initialized to `None`
    /// (unconfigured) physical channel.
    ///
    /// # Errors
    /// Returns [`Error::IeContent`] if `arfcn` is outside `0..=1023`
    /// (spec.md §3 invariant, §8 "ARFCN bounds").
    pub fn new(index: u8, arfcn: u16) -> Result<Self> {
        if arfcn > 1023 {
            return Err(Error::IeContent(format!(
                "ARFCN {arfcn} out of range (0..=1023)"
            )));
        }
        Ok(Self {
            index,
            arfcn,
            nominal_power_dbm: 43,
            max_attenuation_db: 0,
            timeslots: (0..TIMESLOTS_PER_TRX).map(|i| Timeslot::new(i as u8)).collect(),
            admin_state: AdminOpState::default(),
        })
    }

    /// Set the ARFCN, validating range. Used by OML Set-Radio-Attributes.
    ///
    /// # Errors
    /// Returns [`Error::IeContent`] and leaves the TRX unchanged if `arfcn`
    /// is outside `0..=1023`.
    pub fn set_arfcn(&mut self, arfcn: u16) -> Result<()> {
        if arfcn > 1023 {
            return Err(Error::IeContent(format!(
                "ARFCN {arfcn} out of range (0..=1023)"
            )));
        }
        self.arfcn = arfcn;
        Ok(())
    }

    #[must_use]
    pub fn ts(&self, idx: u8) -> Option<&Timeslot> {
        self.timeslots.get(idx as usize)
    }

    pub fn ts_mut(&mut self, idx: u8) -> Option<&mut Timeslot> {
        self.timeslots.get_mut(idx as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_arfcn() {
        assert!(Trx::new(0, 1024).is_err());
        assert!(Trx::new(0, 1023).is_ok());
    }

    #[test]
    fn set_arfcn_leaves_trx_unchanged_on_error() {
        let mut trx = Trx::new(0, 10).unwrap();
        assert!(trx.set_arfcn(2000).is_err());
        assert_eq!(trx.arfcn, 10);
    }
}
