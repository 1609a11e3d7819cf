//! JPJ traffic-violation lookups over an SMS gateway, with TTL caching.
//!
//! The road transport authority answers summons queries by SMS
//! (`JPJ SAMAN <plate>` to shortcode 32728). We reach the shortcode through
//! an HTTP SMS gateway and parse the reply text. Every lookup costs a real
//! SMS, so results are memoized per plate for a configurable TTL; a forced
//! refresh bypasses the cache.
//!
//! Reply grammar:
//!
//! ```text
//! OK <plate> <count>
//! <offence>|<location>|<YYYY-MM-DD>|<ringgit.sen>
//! ...
//! ```
//!
//! or the single line `NO RECORD` when the plate is clean.

use crate::config::JpjConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sewa_core::{Clock, Money, Plate, Violation};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Lookup failure modes.
#[derive(Debug, Clone, Error)]
pub enum JpjError {
    /// The SMS gateway could not be reached or rejected the request.
    #[error("sms gateway error: {0}")]
    Gateway(String),
    /// The gateway replied with text we do not understand.
    #[error("unparseable JPJ reply: {0}")]
    Parse(String),
}

/// Seam for the JPJ query channel.
#[async_trait]
pub trait JpjGateway: Send + Sync {
    /// Queries outstanding summonses for a plate.
    ///
    /// # Errors
    ///
    /// Returns [`JpjError`] when the gateway fails or replies garbage.
    async fn lookup(&self, plate: &Plate) -> Result<Vec<Violation>, JpjError>;
}

/// JPJ SMS shortcode.
const JPJ_SHORTCODE: &str = "32728";

#[derive(Serialize)]
struct SmsRequest<'a> {
    to: &'a str,
    text: String,
}

#[derive(Deserialize)]
struct SmsResponse {
    reply: String,
}

/// Gateway implementation speaking to an HTTP SMS provider.
pub struct SmsJpjGateway {
    client: reqwest::Client,
    url: String,
}

impl SmsJpjGateway {
    /// Builds the gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`JpjError::Gateway`] when the HTTP client cannot be built.
    pub fn new(config: &JpjConfig) -> Result<Self, JpjError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| JpjError::Gateway(e.to_string()))?;
        Ok(Self { client, url: config.gateway_url.clone() })
    }
}

#[async_trait]
impl JpjGateway for SmsJpjGateway {
    #[tracing::instrument(skip(self), fields(plate = %plate))]
    async fn lookup(&self, plate: &Plate) -> Result<Vec<Violation>, JpjError> {
        let request = SmsRequest {
            to: JPJ_SHORTCODE,
            text: format!("JPJ SAMAN {plate}"),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| JpjError::Gateway(e.to_string()))?
            .error_for_status()
            .map_err(|e| JpjError::Gateway(e.to_string()))?;
        let body: SmsResponse = response
            .json()
            .await
            .map_err(|e| JpjError::Gateway(e.to_string()))?;
        parse_sms_reply(plate, &body.reply)
    }
}

/// Parses the gateway's reply text into violation records.
///
/// # Errors
///
/// Returns [`JpjError::Parse`] on malformed headers, a count that
/// disagrees with the number of lines, or unparseable fields.
pub fn parse_sms_reply(plate: &Plate, reply: &str) -> Result<Vec<Violation>, JpjError> {
    let mut lines = reply.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines
        .next()
        .ok_or_else(|| JpjError::Parse("empty reply".to_string()))?;

    if header.eq_ignore_ascii_case("NO RECORD") {
        return Ok(Vec::new());
    }

    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("OK"), Some(reply_plate), Some(count)) => {
            if reply_plate != plate.as_str() {
                return Err(JpjError::Parse(format!(
                    "reply is for plate {reply_plate}, asked about {plate}"
                )));
            }
            let count: usize = count
                .parse()
                .map_err(|_| JpjError::Parse(format!("bad count in header: {header}")))?;
            let violations: Vec<Violation> = lines
                .map(|line| parse_violation_line(plate, line))
                .collect::<Result<_, _>>()?;
            if violations.len() != count {
                return Err(JpjError::Parse(format!(
                    "header announced {count} records, got {}",
                    violations.len()
                )));
            }
            Ok(violations)
        }
        _ => Err(JpjError::Parse(format!("bad header: {header}"))),
    }
}

fn parse_violation_line(plate: &Plate, line: &str) -> Result<Violation, JpjError> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    let [offence, location, date, amount] = fields.as_slice() else {
        return Err(JpjError::Parse(format!("expected 4 fields: {line}")));
    };
    let issued_on = date
        .parse()
        .map_err(|_| JpjError::Parse(format!("bad date {date}")))?;
    Ok(Violation {
        plate: plate.clone(),
        offence: (*offence).to_string(),
        location: (*location).to_string(),
        issued_on,
        amount: parse_ringgit(amount)?,
    })
}

/// Parses `"150.00"`-style decimal ringgit into sen.
fn parse_ringgit(raw: &str) -> Result<Money, JpjError> {
    let bad = || JpjError::Parse(format!("bad amount {raw}"));
    let (ringgit, sen) = raw.split_once('.').unwrap_or((raw, "0"));
    if sen.len() > 2 {
        return Err(bad());
    }
    let ringgit: u64 = ringgit.parse().map_err(|_| bad())?;
    let mut sen: u64 = sen.parse().map_err(|_| bad())?;
    if raw.split_once('.').is_some_and(|(_, s)| s.len() == 1) {
        sen *= 10;
    }
    Money::checked_from_ringgit(ringgit)
        .and_then(|m| m.checked_add(Money::from_sen(sen)))
        .ok_or_else(bad)
}

struct CacheEntry {
    fetched_at: DateTime<Utc>,
    violations: Vec<Violation>,
}

/// Per-plate TTL memoization of lookup results.
struct ViolationCache {
    ttl: chrono::Duration,
    entries: RwLock<HashMap<Plate, CacheEntry>>,
}

impl ViolationCache {
    fn new(ttl: chrono::Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    fn get(&self, plate: &Plate, now: DateTime<Utc>) -> Option<(Vec<Violation>, DateTime<Utc>)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(plate)?;
        if now - entry.fetched_at >= self.ttl {
            return None;
        }
        Some((entry.violations.clone(), entry.fetched_at))
    }

    fn put(&self, plate: Plate, violations: Vec<Violation>, now: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Expired entries are dead weight; drop them while we hold the lock.
        entries.retain(|_, entry| now - entry.fetched_at < self.ttl);
        entries.insert(plate, CacheEntry { fetched_at: now, violations });
    }
}

/// Outcome of a violation lookup.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    /// The outstanding summonses.
    pub violations: Vec<Violation>,
    /// Whether the result came from the cache.
    pub from_cache: bool,
    /// When the underlying gateway query ran.
    pub fetched_at: DateTime<Utc>,
}

/// Cached JPJ lookup service.
pub struct JpjService {
    gateway: Arc<dyn JpjGateway>,
    cache: ViolationCache,
    clock: Arc<dyn Clock>,
}

impl JpjService {
    /// Builds the service.
    #[must_use]
    pub fn new(gateway: Arc<dyn JpjGateway>, ttl: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, cache: ViolationCache::new(ttl), clock }
    }

    /// Looks up outstanding summonses for a plate, serving from cache when
    /// fresh. `force_refresh` always hits the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`JpjError`] when the gateway must be queried and fails.
    pub async fn lookup(
        &self,
        plate: &Plate,
        force_refresh: bool,
    ) -> Result<LookupOutcome, JpjError> {
        let now = self.clock.now();
        if !force_refresh {
            if let Some((violations, fetched_at)) = self.cache.get(plate, now) {
                crate::metrics::record_jpj_lookup(true);
                return Ok(LookupOutcome { violations, from_cache: true, fetched_at });
            }
        }

        let violations = self.gateway.lookup(plate).await?;
        self.cache.put(plate.clone(), violations.clone(), now);
        crate::metrics::record_jpj_lookup(false);
        Ok(LookupOutcome { violations, from_cache: false, fetched_at: now })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sewa_testing::FixedClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn plate() -> Plate {
        Plate::parse("WXY 1234").unwrap()
    }

    #[test]
    fn parses_no_record_reply() {
        assert_eq!(parse_sms_reply(&plate(), "NO RECORD").unwrap(), vec![]);
        assert_eq!(parse_sms_reply(&plate(), "no record\n").unwrap(), vec![]);
    }

    #[test]
    fn parses_multi_record_reply() {
        let reply = "OK WXY1234 2\n\
                     SPEEDING 110/90|PLUS KM302 NORTHBOUND|2026-01-14|300.00\n\
                     RED LIGHT|JALAN AMPANG KL|2026-02-02|150.50";
        let violations = parse_sms_reply(&plate(), reply).unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].offence, "SPEEDING 110/90");
        assert_eq!(violations[0].amount, Money::from_sen(30_000));
        assert_eq!(violations[1].issued_on, "2026-02-02".parse().unwrap());
        assert_eq!(violations[1].amount, Money::from_sen(15_050));
    }

    #[test]
    fn rejects_count_mismatch_and_wrong_plate() {
        let short = "OK WXY1234 2\nSPEEDING|KM1|2026-01-01|100.00";
        assert!(matches!(parse_sms_reply(&plate(), short), Err(JpjError::Parse(_))));

        let wrong = "OK ABC999 0";
        assert!(matches!(parse_sms_reply(&plate(), wrong), Err(JpjError::Parse(_))));
    }

    #[test]
    fn rejects_malformed_lines() {
        let missing_field = "OK WXY1234 1\nSPEEDING|KM1|2026-01-01";
        assert!(parse_sms_reply(&plate(), missing_field).is_err());

        let bad_amount = "OK WXY1234 1\nSPEEDING|KM1|2026-01-01|RM100";
        assert!(parse_sms_reply(&plate(), bad_amount).is_err());
    }

    #[test]
    fn ringgit_amounts_parse_to_sen() {
        assert_eq!(parse_ringgit("150.00").unwrap(), Money::from_sen(15_000));
        assert_eq!(parse_ringgit("150.5").unwrap(), Money::from_sen(15_050));
        assert_eq!(parse_ringgit("150").unwrap(), Money::from_sen(15_000));
        assert!(parse_ringgit("1.234").is_err());
        assert!(parse_ringgit("abc").is_err());
    }

    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JpjGateway for CountingGateway {
        async fn lookup(&self, plate: &Plate) -> Result<Vec<Violation>, JpjError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Violation {
                plate: plate.clone(),
                offence: "SPEEDING".to_string(),
                location: "KM1".to_string(),
                issued_on: "2026-01-01".parse().unwrap(),
                amount: Money::from_ringgit(300),
            }])
        }
    }

    fn service(clock: &FixedClock) -> (JpjService, Arc<CountingGateway>) {
        let gateway = Arc::new(CountingGateway { calls: AtomicUsize::new(0) });
        let service = JpjService::new(
            Arc::clone(&gateway) as Arc<dyn JpjGateway>,
            chrono::Duration::hours(6),
            Arc::new(clock.clone()),
        );
        (service, gateway)
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let clock = FixedClock::default_instant();
        let (service, gateway) = service(&clock);

        let first = service.lookup(&plate(), false).await.unwrap();
        assert!(!first.from_cache);

        clock.advance(chrono::Duration::hours(1));
        let second = service.lookup(&plate(), false).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.violations, first.violations);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_expires_after_ttl() {
        let clock = FixedClock::default_instant();
        let (service, gateway) = service(&clock);

        service.lookup(&plate(), false).await.unwrap();
        clock.advance(chrono::Duration::hours(6));
        let again = service.lookup(&plate(), false).await.unwrap();
        assert!(!again.from_cache);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_a_fresh_cache() {
        let clock = FixedClock::default_instant();
        let (service, gateway) = service(&clock);

        service.lookup(&plate(), false).await.unwrap();
        let refreshed = service.lookup(&plate(), true).await.unwrap();
        assert!(!refreshed.from_cache);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn plates_cache_independently() {
        let clock = FixedClock::default_instant();
        let (service, gateway) = service(&clock);

        service.lookup(&plate(), false).await.unwrap();
        service
            .lookup(&Plate::parse("ABC 999").unwrap(), false)
            .await
            .unwrap();
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }
}
