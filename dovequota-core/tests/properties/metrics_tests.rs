//! Property tests for per-account sensor readings

use std::collections::BTreeMap;

use dovequota_core::quota::{DeviceInfo, MetricUnit, entity_id};
use dovequota_core::{QuotaMetric, QuotaRecord, QuotaSnapshot};
use proptest::prelude::*;

fn account_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9.]{1,12}@[a-zA-Z]{1,8}\\.[a-z]{2,3}"
}

fn snapshot_of(accounts: &[String]) -> QuotaSnapshot {
    let records: BTreeMap<String, QuotaRecord> = accounts
        .iter()
        .map(|a| (a.clone(), QuotaRecord::bounded(a.as_str(), 10.0, 100.0, 10.0)))
        .collect();
    QuotaSnapshot::new(records, 0)
}

proptest! {
    /// Property: five readings per selected account, in selection order
    #[test]
    fn readings_cover_every_metric(
        accounts in prop::collection::vec(account_strategy(), 0..6),
    ) {
        let snapshot = snapshot_of(&accounts);
        let readings = snapshot.readings(&accounts);

        prop_assert_eq!(readings.len(), accounts.len() * QuotaMetric::ALL.len());
        for (chunk, account) in readings.chunks(QuotaMetric::ALL.len()).zip(&accounts) {
            for (reading, metric) in chunk.iter().zip(QuotaMetric::ALL) {
                prop_assert_eq!(&reading.account, account);
                prop_assert_eq!(reading.metric, metric);
                prop_assert!(reading.value.is_some());
            }
        }
    }

    /// Property: entity ids are lowercase and carry the metric key
    #[test]
    fn entity_ids_are_lowercase(account in account_strategy()) {
        for metric in QuotaMetric::ALL {
            let id = entity_id(&account, metric);
            prop_assert_eq!(id.clone(), id.to_lowercase());
            prop_assert!(id.starts_with("sensor."));
            prop_assert!(id.ends_with(metric.key()));
        }
    }

    /// Property: unknown accounts produce readings with no values
    #[test]
    fn unknown_accounts_have_no_values(account in account_strategy()) {
        let readings = QuotaSnapshot::empty().readings(&[account.as_str()]);
        prop_assert_eq!(readings.len(), QuotaMetric::ALL.len());
        prop_assert!(readings.iter().all(|r| r.value.is_none()));
    }
}

#[test]
fn metric_metadata() {
    assert_eq!(QuotaMetric::Used.unit(), MetricUnit::Kilobytes);
    assert_eq!(QuotaMetric::PercentageFree.unit(), MetricUnit::Percent);
    assert!(QuotaMetric::Quota.enabled_by_default());
    assert!(!QuotaMetric::Free.enabled_by_default());
    assert_eq!("percentage_used".parse::<QuotaMetric>(), Ok(QuotaMetric::PercentageUsed));
    assert!("bogus".parse::<QuotaMetric>().is_err());
}

#[test]
fn device_info_carries_version() {
    let snapshot = QuotaSnapshot::empty().with_version(Some("2.3.21".into()));
    assert_eq!(
        snapshot.device_info("Alice@Example.com"),
        DeviceInfo {
            name: "Alice@Example.com".into(),
            model: "Quota",
            manufacturer: "Dovecot",
            sw_version: Some("2.3.21".into()),
        }
    );
}
