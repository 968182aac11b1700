//! Fixed-price alert evaluation and alert parsing
//!
//! Alerts are one-shot: `active -> triggered -> removed`. A cycle checks
//! every alert against a single price map and returns the survivors so the
//! caller can write the list back in one batch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::common::errors::{MonitorError, Result};
use crate::common::types::{AlertCondition, PriceAlert, PriceMap};

/// An alert whose condition was met
#[derive(Debug, Clone, PartialEq)]
pub struct AlertTrigger {
    pub alert: PriceAlert,
    pub current_price: Decimal,
    pub triggered_at: DateTime<Utc>,
}

/// Result of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertEvaluation {
    pub triggered: Vec<AlertTrigger>,
    /// Alerts still active, in their original order
    pub remaining: Vec<PriceAlert>,
}

impl AlertEvaluation {
    pub fn any_triggered(&self) -> bool {
        !self.triggered.is_empty()
    }
}

/// Evaluate every alert against one consistent price map
///
/// Alerts whose instrument has no price stay active untouched.
pub fn evaluate_alerts(
    alerts: Vec<PriceAlert>,
    prices: &PriceMap,
    now: DateTime<Utc>,
) -> AlertEvaluation {
    let mut evaluation = AlertEvaluation::default();

    for alert in alerts {
        match prices.get(&alert.instrument) {
            Some(tick) if alert.condition.is_met(tick.price, alert.target_price) => {
                evaluation.triggered.push(AlertTrigger {
                    alert,
                    current_price: tick.price,
                    triggered_at: now,
                });
            }
            _ => evaluation.remaining.push(alert),
        }
    }

    evaluation
}

/// Build an alert after validating user input
pub fn new_alert(
    instrument: &str,
    condition: AlertCondition,
    target_price: Decimal,
) -> Result<PriceAlert> {
    let instrument = normalize_instrument(instrument)?;

    if target_price <= Decimal::ZERO {
        return Err(MonitorError::InvalidAlert(format!(
            "target price must be positive, got {}",
            target_price
        )));
    }

    Ok(PriceAlert {
        id: Uuid::new_v4(),
        instrument,
        condition,
        target_price,
        created_at: Utc::now(),
    })
}

/// Parse `"BTC-USDT > 50000"` into an alert
pub fn parse_alert(input: &str) -> Result<PriceAlert> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let [instrument, condition, price] = parts.as_slice() else {
        return Err(MonitorError::InvalidAlert(format!(
            "expected '<INSTRUMENT> <>|<> <PRICE>', got '{}'",
            input.trim()
        )));
    };

    let condition: AlertCondition = condition.parse()?;
    let target_price: Decimal = price
        .parse()
        .map_err(|_| MonitorError::InvalidAlert(format!("'{}' is not a valid price", price)))?;

    new_alert(instrument, condition, target_price)
}

/// Upper-case and check the `BASE-QUOTE` shape
pub fn normalize_instrument(instrument: &str) -> Result<String> {
    let upper = instrument.trim().to_uppercase();
    let valid = match upper.split_once('-') {
        Some((base, quote)) => {
            !base.is_empty()
                && !quote.is_empty()
                && base.chars().all(|c| c.is_ascii_alphanumeric())
                && quote.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    };

    if valid {
        Ok(upper)
    } else {
        Err(MonitorError::InvalidAlert(format!(
            "'{}' is not an instrument like BTC-USDT",
            instrument
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::PriceTick;
    use rust_decimal_macros::dec;

    fn prices(entries: &[(&str, Decimal)]) -> PriceMap {
        entries
            .iter()
            .map(|(i, p)| (i.to_string(), PriceTick::new(*p)))
            .collect()
    }

    fn alert(instrument: &str, condition: AlertCondition, target: Decimal) -> PriceAlert {
        new_alert(instrument, condition, target).unwrap()
    }

    #[test]
    fn test_greater_than_triggers_on_boundary() {
        let a = alert("BTC-USDT", AlertCondition::GreaterThan, dec!(50000));
        let b = alert("ETH-USDT", AlertCondition::LessThan, dec!(3000));
        let evaluation = evaluate_alerts(
            vec![a.clone(), b.clone()],
            &prices(&[("BTC-USDT", dec!(50000)), ("ETH-USDT", dec!(3100))]),
            Utc::now(),
        );

        assert_eq!(evaluation.triggered.len(), 1);
        assert_eq!(evaluation.triggered[0].alert, a);
        assert_eq!(evaluation.triggered[0].current_price, dec!(50000));
        assert_eq!(evaluation.remaining, vec![b]);
    }

    #[test]
    fn test_less_than_triggers_on_boundary() {
        let a = alert("ETH-USDT", AlertCondition::LessThan, dec!(3000));
        let evaluation = evaluate_alerts(vec![a], &prices(&[("ETH-USDT", dec!(3000))]), Utc::now());
        assert!(evaluation.any_triggered());
        assert!(evaluation.remaining.is_empty());
    }

    #[test]
    fn test_missing_price_keeps_alert_active() {
        let a = alert("NEW-USDT", AlertCondition::GreaterThan, dec!(1));
        let evaluation = evaluate_alerts(vec![a.clone()], &PriceMap::new(), Utc::now());
        assert!(!evaluation.any_triggered());
        assert_eq!(evaluation.remaining, vec![a]);
    }

    #[test]
    fn test_parse_alert() {
        let parsed = parse_alert("btc-usdt > 50000").unwrap();
        assert_eq!(parsed.instrument, "BTC-USDT");
        assert_eq!(parsed.condition, AlertCondition::GreaterThan);
        assert_eq!(parsed.target_price, dec!(50000));

        let parsed = parse_alert("ETH-USDT < 2999.5").unwrap();
        assert_eq!(parsed.condition, AlertCondition::LessThan);
    }

    #[test]
    fn test_parse_alert_rejects_bad_input() {
        for input in [
            "BTC-USDT > 0",
            "BTC-USDT > -5",
            "BTC-USDT >= 50000",
            "BTC-USDT > abc",
            "BTCUSDT > 50000",
            "BTC-USDT 50000",
            "BTC-US$T > 1",
            "",
        ] {
            assert!(
                matches!(parse_alert(input), Err(MonitorError::InvalidAlert(_))),
                "accepted {:?}",
                input
            );
        }
    }
}
