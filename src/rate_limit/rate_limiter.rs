use crate::api::APIError;
use crate::IPAddr;
use crate::RantifyError;
use log::debug;
use std::collections::HashMap;
use std::time::SystemTime;
use strum::IntoEnumIterator;

#[derive(Debug, Clone)]
pub struct RateLimitBucket {
  last_checked: SystemTime,
  allowance: f64,
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, EnumIter)]
pub enum RateLimitType {
  Message,
  Register,
  Post,
}

/// Rate limiting based on rate type and IP addr
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
  pub buckets: HashMap<RateLimitType, HashMap<IPAddr, RateLimitBucket>>,
}

impl RateLimiter {
  fn insert_ip(&mut self, ip: &str) {
    for rate_limit_type in RateLimitType::iter() {
      if self.buckets.get(&rate_limit_type).is_none() {
        self.buckets.insert(rate_limit_type, HashMap::new());
      }

      if let Some(bucket) = self.buckets.get_mut(&rate_limit_type) {
        if bucket.get(ip).is_none() {
          bucket.insert(
            ip.to_string(),
            RateLimitBucket {
              last_checked: SystemTime::now(),
              allowance: -2f64,
            },
          );
        }
      }
    }
  }

  /// Rate limiting Algorithm described here: https://stackoverflow.com/a/668327/1655478
  #[allow(clippy::float_cmp)]
  pub fn check_rate_limit_full(
    &mut self,
    type_: RateLimitType,
    ip: &str,
    rate: i32,
    per: i32,
    check_only: bool,
  ) -> Result<(), RantifyError> {
    self.insert_ip(ip);
    if let Some(bucket) = self.buckets.get_mut(&type_) {
      if let Some(rate_limit) = bucket.get_mut(ip) {
        let current = SystemTime::now();
        let time_passed = current
          .duration_since(rate_limit.last_checked)
          .map(|d| d.as_secs() as f64)
          .unwrap_or(0.0);

        // The initial value of -2 tells us to set the initial allowance
        if rate_limit.allowance == -2f64 {
          rate_limit.allowance = f64::from(rate);
        };

        rate_limit.last_checked = current;
        rate_limit.allowance += time_passed * (f64::from(rate) / f64::from(per));
        if !check_only && rate_limit.allowance > f64::from(rate) {
          rate_limit.allowance = f64::from(rate);
        }

        if rate_limit.allowance < 1.0 {
          debug!(
            "Rate limited IP: {}, time_passed: {}, allowance: {}",
            ip, time_passed, rate_limit.allowance
          );
          Err(
            APIError {
              message: format!("Too many requests. {} per {} seconds", rate, per),
            }
            .into(),
          )
        } else {
          if !check_only {
            rate_limit.allowance -= 1.0;
          }
          Ok(())
        }
      } else {
        Ok(())
      }
    } else {
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_limit_exhausts_and_rejects() {
    let mut limiter = RateLimiter::default();

    for _ in 0..3 {
      limiter
        .check_rate_limit_full(RateLimitType::Register, "10.0.0.1", 3, 3600, false)
        .unwrap();
    }

    // the fourth registration from the same address is over the limit
    assert!(limiter
      .check_rate_limit_full(RateLimitType::Register, "10.0.0.1", 3, 3600, false)
      .is_err());

    // a different address still has a full bucket
    assert!(limiter
      .check_rate_limit_full(RateLimitType::Register, "10.0.0.2", 3, 3600, false)
      .is_ok());
  }

  #[test]
  fn test_check_only_does_not_consume() {
    let mut limiter = RateLimiter::default();

    for _ in 0..10 {
      limiter
        .check_rate_limit_full(RateLimitType::Post, "10.0.0.1", 6, 600, true)
        .unwrap();
    }

    // check_only left the bucket untouched, a real request still passes
    assert!(limiter
      .check_rate_limit_full(RateLimitType::Post, "10.0.0.1", 6, 600, false)
      .is_ok());
  }

  #[test]
  fn test_types_have_separate_buckets() {
    let mut limiter = RateLimiter::default();

    for _ in 0..3 {
      limiter
        .check_rate_limit_full(RateLimitType::Register, "10.0.0.1", 3, 3600, false)
        .unwrap();
    }
    assert!(limiter
      .check_rate_limit_full(RateLimitType::Register, "10.0.0.1", 3, 3600, false)
      .is_err());

    // messages from the same address are unaffected
    assert!(limiter
      .check_rate_limit_full(RateLimitType::Message, "10.0.0.1", 180, 60, false)
      .is_ok());
  }
}
