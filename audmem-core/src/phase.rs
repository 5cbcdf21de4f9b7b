/// Coarse stages of a session.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Refresh intervals are being measured; no trial is running.
    #[default]
    Calibration,
    Trials,
    Finished,
}

impl SessionPhase {
    pub fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Calibration => Trials,
            Trials => Finished,
            Finished => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order_and_stop() {
        let mut phase = SessionPhase::default();
        assert_eq!(phase, SessionPhase::Calibration);
        phase = phase.next().unwrap();
        assert_eq!(phase, SessionPhase::Trials);
        phase = phase.next().unwrap();
        assert_eq!(phase, SessionPhase::Finished);
        assert_eq!(phase.next(), None);
    }
}
