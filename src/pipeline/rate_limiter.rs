use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

use crate::models::SourceKind;

pub struct RateLimiter;

impl RateLimiter {
    /// Jittered pre-request delay, tuned per upstream. The statistical
    /// endpoint sits behind an aggressive WAF; randomizing the cadence keeps
    /// burst fan-outs from looking like a scraper.
    pub async fn wait(source: SourceKind) {
        let delay = match source {
            SourceKind::Fred => {
                let mut rng = rand::thread_rng();
                rng.gen_range(250..750)
            }
            SourceKind::Market => {
                let mut rng = rand::thread_rng();
                rng.gen_range(100..300)
            }
        };
        sleep(Duration::from_millis(delay)).await;
    }
}
