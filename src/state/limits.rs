use std::{net::IpAddr, num::NonZeroU32, sync::Arc, time::Duration};

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::config::RateLimitConfig;

/// Keyed limiter counting requests per client address.
pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// One request budget together with how far the forwarded chain is trusted.
#[derive(Clone)]
pub struct RateLimitGate {
    limiter: Arc<IpRateLimiter>,
    trusted_proxy_hops: usize,
}

impl RateLimitGate {
    /// Count one request for `ip`; false once the budget is exhausted.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }

    pub fn trusted_proxy_hops(&self) -> usize {
        self.trusted_proxy_hops
    }
}

/// The two request budgets applied to the API.
#[derive(Clone)]
pub struct RateLimits {
    api: Arc<IpRateLimiter>,
    submission: Arc<IpRateLimiter>,
    trusted_proxy_hops: usize,
}

impl RateLimits {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            trusted_proxy_hops: config.trusted_proxy_hops,
            api: Arc::new(RateLimiter::keyed(quota(
                config.window,
                config.api_max_requests,
            ))),
            submission: Arc::new(RateLimiter::keyed(quota(
                config.window,
                config.submission_max_requests,
            ))),
        }
    }

    /// Budget shared by every API route.
    pub fn api(&self) -> RateLimitGate {
        self.gate(&self.api)
    }

    /// Stricter budget for routes that write scores, points or votes.
    pub fn submission(&self) -> RateLimitGate {
        self.gate(&self.submission)
    }

    fn gate(&self, limiter: &Arc<IpRateLimiter>) -> RateLimitGate {
        RateLimitGate {
            limiter: limiter.clone(),
            trusted_proxy_hops: self.trusted_proxy_hops,
        }
    }

    /// Forget clients whose budget is fully replenished.
    pub fn retain_recent(&self) {
        self.api.retain_recent();
        self.submission.retain_recent();
    }
}

/// `max_requests` per `window`, all of them usable as a burst.
fn quota(window: Duration, max_requests: u32) -> Quota {
    let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
    Quota::with_period(window / burst.get())
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn budget_is_per_address() {
        let limits = RateLimits::new(&RateLimitConfig {
            window: Duration::from_secs(15 * 60),
            api_max_requests: 3,
            submission_max_requests: 1,
            trusted_proxy_hops: 1,
        });
        let first = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let second = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        let api = limits.api();
        for _ in 0..3 {
            assert!(api.check(first));
        }
        assert!(!api.check(first));
        assert!(api.check(second));

        let submission = limits.submission();
        assert!(submission.check(first));
        assert!(!submission.check(first));
        assert_eq!(submission.trusted_proxy_hops(), 1);
    }
}
