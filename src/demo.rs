//! Demonstration driver
//!
//! Exercises the broker the way an application would: three subscribers with
//! overlapping topics, one `listen` task each, a publisher emitting random
//! values at random intervals, and a fixed timeline of membership changes.
//! The timeline is scaled to `run_secs`:
//!
//! | at        | action                               |
//! |-----------|--------------------------------------|
//! | 1/6       | s2 subscribes to topic 0             |
//! | 1/2       | s2 unsubscribes from topic 1         |
//! | 5/6       | s2 is removed                        |
//! | end       | s1 and s3 are removed, publisher stops |

use std::error::Error;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{info, warn};

use crate::broker::Broker;
use crate::config::DemoSettings;

pub async fn run(broker: Arc<Broker>, settings: DemoSettings) -> Result<(), Box<dyn Error>> {
    if settings.topics.is_empty() {
        return Err("demo needs at least one topic".into());
    }
    let topic = |i: usize| settings.topics[i % settings.topics.len()].as_str();

    let cap = settings.subscriber_capacity;
    let s1 = broker.add_subscriber(cap);
    broker.subscribe(&s1, topic(0));
    broker.subscribe(&s1, topic(1));

    let s2 = broker.add_subscriber(cap);
    broker.subscribe(&s2, topic(1));
    broker.subscribe(&s2, topic(2));

    let s3 = broker.add_subscriber(cap);
    broker.subscribe(&s3, topic(2));
    broker.subscribe(&s3, topic(3));

    let listeners: Vec<_> = [&s1, &s2, &s3]
        .into_iter()
        .map(|s| {
            let s = Arc::clone(s);
            tokio::spawn(async move { s.listen().await })
        })
        .collect();

    let (stop_tx, stop_rx) = oneshot::channel();
    let publisher = tokio::spawn(publish_loop(
        Arc::clone(&broker),
        settings.clone(),
        stop_rx,
    ));

    let run = Duration::from_secs(settings.run_secs);
    let start = Instant::now();

    sleep_until(start + run / 6).await;
    broker.subscribe(&s2, topic(0));

    sleep_until(start + run / 2).await;
    broker.unsubscribe(&s2, topic(1));

    sleep_until(start + run * 5 / 6).await;
    broker.remove_subscriber(&s2);

    sleep_until(start + run).await;
    broker.remove_subscriber(&s1);
    broker.remove_subscriber(&s3);

    let _ = stop_tx.send(());
    publisher.await?;
    for listener in join_all(listeners).await {
        listener?;
    }

    info!(stats = ?broker.stats(), "demo finished");
    Ok(())
}

async fn publish_loop(
    broker: Arc<Broker>,
    settings: DemoSettings,
    mut stop: oneshot::Receiver<()>,
) {
    let mut rng = StdRng::from_entropy();
    let interval = publish_interval(&settings);
    let mut delay = Duration::from_secs(1);

    loop {
        tokio::select! {
            _ = &mut stop => return,
            _ = sleep(delay) => {}
        }

        let topic = &settings.topics[rng.gen_range(0..settings.topics.len())];
        let body = format!("{:.6}", rng.gen_range(0.0..1.0_f64));

        info!(topic = %topic, body = %body, "publishing message");
        if let Err(e) = broker.publish(topic, body) {
            warn!(topic = %topic, error = %e, "can't publish message");
        }

        delay = Duration::from_millis(rng.gen_range(interval.clone()));
    }
}

/// Publish delays in milliseconds, `[min, max)` with at least one value.
fn publish_interval(settings: &DemoSettings) -> RangeInclusive<u64> {
    let lo = settings.min_interval_ms;
    lo..=settings.max_interval_ms.saturating_sub(1).max(lo)
}
