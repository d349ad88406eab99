use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real head counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// One filter over both usernames and emails: registration rejects a clash
/// on either, so they share a namespace here.
static IDENTITY_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(identity: &str) -> String {
    identity.to_lowercase()
}

/// Check if a username/email might exist (false positives possible)
pub fn might_exist(identity: &str) -> bool {
    let identity = normalize(identity);
    IDENTITY_FILTER
        .read()
        .expect("identity filter poisoned")
        .contains(&identity)
}

/// Insert a single username/email into the filter
pub fn insert(identity: &str) {
    let identity = normalize(identity);
    IDENTITY_FILTER
        .write()
        .expect("identity filter poisoned")
        .add(&identity);
}

/// Warm up the identity filter using streaming + batching
pub async fn warmup_identity_filter(pool: &SqlitePool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String, String)>("SELECT username, email FROM users").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size * 2);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (username, email) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&username));
        batch.push(normalize(&email));
        total += 1;

        if batch.len() >= batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Identity filter warmup complete: {} users", total);
    Ok(())
}

/// Insert a batch of normalized identities
fn insert_batch(identities: &[String]) {
    let mut filter = IDENTITY_FILTER.write().expect("identity filter poisoned");

    for identity in identities {
        filter.add(identity);
    }
}
