//! Maps `Box<dyn Error>` from trait boundaries to typed `DissociationError`.
//!
//! The traits in `tumbler_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `tumbler_hardware::HwError` downcasting.

use crate::error::DissociationError;

/// Map a trait-boundary error to a typed `DissociationError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DissociationError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<tumbler_hardware::HwError>() {
            return match hw {
                tumbler_hardware::HwError::Timeout => DissociationError::Timeout,
                other => DissociationError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        DissociationError::Timeout
    } else {
        DissociationError::Hardware(s)
    }
}

/// Wrap a trait-boundary error into a report carrying the typed error.
pub(crate) fn hw_report(e: Box<dyn std::error::Error + Send + Sync>) -> eyre::Report {
    eyre::Report::new(map_hw_error(&*e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e = std::io::Error::other("bus timeout on read");
        assert!(matches!(map_hw_error(&e), DissociationError::Timeout));
    }

    #[test]
    fn other_text_maps_to_hardware() {
        let e = std::io::Error::other("nack");
        match map_hw_error(&e) {
            DissociationError::Hardware(msg) => assert_eq!(msg, "nack"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hw_errors_are_downcast() {
        let e = tumbler_hardware::HwError::Timeout;
        assert!(matches!(map_hw_error(&e), DissociationError::Timeout));
        let e = tumbler_hardware::HwError::I2c("nack".into());
        assert!(matches!(
            map_hw_error(&e),
            DissociationError::HardwareFault(_)
        ));
    }
}
