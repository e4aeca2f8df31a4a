//! Test fixtures and raw record generators.

use std::fs;
use std::io::Write;

use pipeline_core::StoreLayout;

pub const PRODUCTS: [&str; 6] = ["Laptop", "Mouse", "Keyboard", "Monitor", "Headset", "Webcam"];
pub const REGIONS: [&str; 4] = ["US", "EU", "APAC", "LATAM"];

/// An isolated pipeline data directory that cleans up on drop.
pub struct TestPipeline {
    _dir: tempfile::TempDir,
    pub layout: StoreLayout,
}

impl TestPipeline {
    /// Fresh layout with raw directories created and a small default
    /// dimension table: user 1 = Alice/US, 2 = Bob/EU, 3 = Carol/APAC.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::from_base_dir(dir.path());
        fs::create_dir_all(&layout.raw_batch_dir).unwrap();
        fs::create_dir_all(&layout.raw_stream_dir).unwrap();

        let pipeline = Self { _dir: dir, layout };
        pipeline.write_users(&[
            (1, "Alice", "US"),
            (2, "Bob", "EU"),
            (3, "Carol", "APAC"),
        ]);
        pipeline
    }

    pub fn write_users(&self, users: &[(i64, &str, &str)]) {
        fs::create_dir_all(self.layout.dimension_path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(&self.layout.dimension_path).unwrap();
        writeln!(f, "user_id,name,region,signup_date").unwrap();
        for (user_id, name, region) in users {
            writeln!(f, "{user_id},{name},{region},2023-06-01").unwrap();
        }
    }

    pub fn write_batch_file(&self, name: &str, lines: &[String]) {
        let mut f = fs::File::create(self.layout.raw_batch_dir.join(name)).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
    }

    pub fn write_stream_file(&self, name: &str, lines: &[String]) {
        let mut f = fs::File::create(self.layout.raw_stream_dir.join(name)).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
    }
}

impl Default for TestPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// One raw transaction line in the upstream dump format.
pub fn transaction(id: &str, user_id: i64, amount: f64, timestamp: &str, status: &str) -> String {
    serde_json::json!({
        "transaction_id": id,
        "user_id": user_id,
        "product": PRODUCTS[(user_id.unsigned_abs() as usize) % PRODUCTS.len()],
        "amount": amount,
        "timestamp": timestamp,
        "status": status,
    })
    .to_string()
}

/// A raw batch record with COMPLETED status.
pub fn batch_transaction(id: &str, user_id: i64, amount: f64, timestamp: &str) -> String {
    transaction(id, user_id, amount, timestamp, "COMPLETED")
}

/// A raw stream record with PENDING status.
pub fn stream_transaction(id: &str, user_id: i64, amount: f64, timestamp: &str) -> String {
    transaction(id, user_id, amount, timestamp, "PENDING")
}
