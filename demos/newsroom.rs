//! Example demonstrating a newsroom publishing to subscribers.
//!
//! This example shows how to:
//! - Register listener types and closures
//! - Unregister by reference and by dropping a subscription
//! - Handle failing listeners under the best-effort policy
//! - Catch up a late subscriber with the latest edition
//!
//! Run with: cargo run --example newsroom

use observer_registry::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Reader {
    name: &'static str,
}

impl Listener<String> for Reader {
    fn notify(&self, news: &String) -> std::result::Result<(), ListenerError> {
        println!("[{}] received: {}", self.name, news);
        Ok(())
    }
}

struct Archive {
    capacity: usize,
    stored: AtomicUsize,
}

impl Listener<String> for Archive {
    fn notify(&self, news: &String) -> std::result::Result<(), ListenerError> {
        if self.stored.fetch_add(1, Ordering::SeqCst) >= self.capacity {
            return Err(ListenerError::msg(format!("archive full, dropped '{news}'")));
        }
        println!("[Archive] stored: {}", news);
        Ok(())
    }
}

fn main() -> Result<()> {
    println!("=== Newsroom Example ===\n");

    let publisher = NotificationRegistry::builder()
        .with_delivery_policy(DeliveryPolicy::BestEffort)
        .with_latest_cache(true)
        .build::<String>();

    let john = Arc::new(Reader { name: "John" });
    let alice = Arc::new(Reader { name: "Alice" });
    publisher.register(john.clone());
    publisher.register(alice.clone());
    publisher.register(Arc::new(Archive {
        capacity: 1,
        stored: AtomicUsize::new(0),
    }));

    let ticker = publisher.subscribe(infallible(|news: &String| {
        println!("[Ticker] {}", news.to_uppercase());
    }));

    println!("--- Edition 1 ---");
    publisher.broadcast("Breaking News: Sunny Weather Forecast!".to_string())?;

    println!("\n--- John cancels, ticker goes offline ---");
    publisher.unregister(&john);
    drop(ticker);

    println!("\n--- Edition 2 ---");
    match publisher.broadcast("Important Announcement: New Subscription Rates!".to_string()) {
        Ok(delivered) => println!("Delivered to {} subscribers", delivered),
        Err(err) => {
            println!("Delivered with problems: {}", err);
            for failure in err.failures() {
                println!("  - {}: {}", failure, failure.error);
            }
        }
    }

    println!("\n--- Late subscriber ---");
    let bob = Arc::new(Reader { name: "Bob" });
    if publisher.register_and_replay(bob)? {
        println!("Bob caught up with the latest edition");
    }

    println!("\nSubscribers remaining: {}", publisher.len());
    Ok(())
}
