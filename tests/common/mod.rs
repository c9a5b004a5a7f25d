//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

/// Header of an NSL-KDD-like file with a reduced attribute set
pub const KDD_HEADER: &str = "% NSL-KDD style fixture
@relation 'KDDTrain'

@attribute duration numeric
@attribute protocol_type {tcp,udp,icmp}
@attribute service {http,private,ftp_data,smtp}
@attribute flag {SF,S0,REJ}
@attribute src_bytes numeric
@attribute dst_bytes numeric
@attribute same_srv_rate real
@attribute dst_host_srv_count integer
@attribute class {normal,anomaly}

@data
";

/// Generate an NSL-KDD-like ARFF document.
///
/// Normal rows use flag `SF` with high `same_srv_rate`; anomalies use `S0` or
/// `REJ` with tiny payloads, so a linear model separates them easily. About
/// one row in twenty has a missing `dst_bytes`. Protocols cycle, so every
/// protocol group holds a third of the rows.
pub fn kdd_arff(rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let protocols = ["tcp", "udp", "icmp"];
    let services = ["http", "private", "ftp_data", "smtp"];

    let mut out = String::from(KDD_HEADER);
    for i in 0..rows {
        let protocol = protocols[i % 3];
        let service = services[rng.gen_range(0..services.len())];
        let attack = rng.gen_bool(0.4);

        let (flag, src_bytes, same_srv_rate, class) = if attack {
            let flag = if rng.gen_bool(0.5) { "S0" } else { "REJ" };
            (flag, rng.gen_range(0..40), rng.gen_range(0.0..0.2), "anomaly")
        } else {
            ("SF", rng.gen_range(150..3000), rng.gen_range(0.8..1.0), "normal")
        };

        let dst_bytes = if rng.gen_bool(0.05) {
            "?".to_string()
        } else {
            rng.gen_range(0..5000).to_string()
        };

        out.push_str(&format!(
            "{},{},{},{},{},{},{:.2},{},{}\n",
            rng.gen_range(0..10),
            protocol,
            service,
            flag,
            src_bytes,
            dst_bytes,
            same_srv_rate,
            rng.gen_range(0..256),
            class
        ));
    }
    out
}

/// Rows where `class` is `normal` for the first `normal` rows, then `anomaly`
pub fn labeled_arff(normal: usize, attack: usize) -> String {
    let mut out = String::from(
        "@relation labeled\n@attribute id numeric\n@attribute class {normal,anomaly}\n@data\n",
    );
    for i in 0..normal + attack {
        let class = if i < normal { "normal" } else { "anomaly" };
        out.push_str(&format!("{},{}\n", i, class));
    }
    out
}

/// Create a temporary directory holding an ARFF file with the given contents
pub fn create_temp_arff(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.arff");
    std::fs::write(&path, contents).unwrap();
    (temp_dir, path)
}
