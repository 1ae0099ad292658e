//! Test Vector Generator
//!
//! Generates JSON test vectors for the mint contract's whitelist checks.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whitelist_proof::{leaf_hash, verify, Address, Hash, Whitelist, WhitelistTree};

#[derive(Parser, Debug)]
#[command(name = "generate-test-vectors")]
#[command(about = "Generate whitelist proof test vectors for mint contract tests")]
struct Args {
    /// Whitelist JSON file (array of address strings)
    #[arg(short, long)]
    whitelist: PathBuf,

    /// Output directory for test vectors
    #[arg(short, long, default_value = "../../contracts/test-vectors")]
    output: PathBuf,
}

/// Test vector file format
#[derive(Debug, Serialize)]
struct TestVectorFile {
    /// Root to register with the contract
    root: Hash,
    /// Number of leaves, duplicates included
    leaves: usize,
    /// Valid claims with proofs
    claims: Vec<TestClaim>,
    /// Invalid claims for negative testing
    invalid_claims: Vec<InvalidTestClaim>,
}

/// A whitelisted address with its proof
#[derive(Debug, Serialize)]
struct TestClaim {
    address: Address,
    expected_valid: bool,
    leaf: Hash,
    proof: Vec<Hash>,
}

/// A claim the contract must reject
#[derive(Debug, Serialize)]
struct InvalidTestClaim {
    description: String,
    address: Address,
    expected_valid: bool,
    leaf: Hash,
    proof: Vec<Hash>,
}

fn generate(whitelist: &Whitelist) -> Result<TestVectorFile> {
    let tree = whitelist
        .build_tree()
        .context("Cannot build a tree from the whitelist")?;
    let root = tree.root();

    let claims = whitelist
        .addresses()
        .iter()
        .map(|address| -> Result<TestClaim> {
            Ok(TestClaim {
                address: *address,
                expected_valid: true,
                leaf: leaf_hash(address),
                proof: tree.proof(address)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let invalid_claims = invalid_claims(&tree, &claims);
    debug_assert!(claims.iter().all(|c| verify(&root, &c.leaf, &c.proof)));
    debug_assert!(invalid_claims
        .iter()
        .all(|c| !verify(&root, &c.leaf, &c.proof)));

    Ok(TestVectorFile {
        root,
        leaves: tree.len(),
        claims,
        invalid_claims,
    })
}

fn invalid_claims(tree: &WhitelistTree, claims: &[TestClaim]) -> Vec<InvalidTestClaim> {
    let mut invalid = Vec::new();
    let Some(first) = claims.first() else {
        return invalid;
    };

    // Lowest address with no leaf
    if let Some(outsider) = (1..=u8::MAX)
        .map(Address::with_last_byte)
        .find(|a| !tree.contains(a))
    {
        invalid.push(InvalidTestClaim {
            description: "non-member reusing a member's proof".to_string(),
            address: outsider,
            expected_valid: false,
            leaf: leaf_hash(&outsider),
            proof: first.proof.clone(),
        });
    }

    let mut tampered = first.proof.clone();
    let mut leaf = first.leaf;
    match tampered.first_mut() {
        Some(sibling) => sibling.0[31] ^= 0x01,
        // Single-leaf tree: the proof is empty, so tamper with the leaf
        None => leaf.0[31] ^= 0x01,
    }
    invalid.push(InvalidTestClaim {
        description: "member with a tampered proof".to_string(),
        address: first.address,
        expected_valid: false,
        leaf,
        proof: tampered,
    });

    if first.proof.len() > 1 {
        invalid.push(InvalidTestClaim {
            description: "member with a truncated proof".to_string(),
            address: first.address,
            expected_valid: false,
            leaf: first.leaf,
            proof: first.proof[..first.proof.len() - 1].to_vec(),
        });
    }

    invalid
}

fn write_vectors(output: &Path, vectors: &TestVectorFile) -> Result<PathBuf> {
    // Ensure output directory exists
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let output_path = output.join("test_vectors.json");
    let json = serde_json::to_string_pretty(vectors)?;
    std::fs::write(&output_path, json)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    Ok(output_path)
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    tracing::info!(
        whitelist = %args.whitelist.display(),
        output = %args.output.display(),
        "Generating test vectors"
    );

    let whitelist = Whitelist::from_json_file(&args.whitelist)?;
    let vectors = generate(&whitelist)?;
    tracing::info!(
        root = %vectors.root,
        claims = vectors.claims.len(),
        invalid_claims = vectors.invalid_claims.len(),
        "Built vectors"
    );

    let output_path = write_vectors(&args.output, &vectors)?;
    tracing::info!(path = %output_path.display(), "Wrote test vectors");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist(bytes: &[u8]) -> Whitelist {
        Whitelist::new(bytes.iter().map(|b| Address::repeat_byte(*b)).collect())
    }

    #[test]
    fn test_claims_verify() {
        let vectors = generate(&whitelist(&[0x11, 0x22, 0x33, 0x44, 0x55])).unwrap();
        assert_eq!(vectors.claims.len(), 5);
        for claim in &vectors.claims {
            assert!(verify(&vectors.root, &claim.leaf, &claim.proof));
        }
    }

    #[test]
    fn test_invalid_claims_fail() {
        let vectors = generate(&whitelist(&[0x11, 0x22, 0x33, 0x44, 0x55])).unwrap();
        assert_eq!(vectors.invalid_claims.len(), 3);
        for claim in &vectors.invalid_claims {
            assert!(!verify(&vectors.root, &claim.leaf, &claim.proof), "{}", claim.description);
        }
    }

    #[test]
    fn test_single_member() {
        let vectors = generate(&whitelist(&[0x11])).unwrap();
        assert!(vectors.claims[0].proof.is_empty());
        assert_eq!(vectors.invalid_claims.len(), 2);
        for claim in &vectors.invalid_claims {
            assert!(!verify(&vectors.root, &claim.leaf, &claim.proof));
        }
    }

    #[test]
    fn test_empty_whitelist_fails() {
        assert!(generate(&Whitelist::default()).is_err());
    }

    #[test]
    fn test_write_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let vectors = generate(&whitelist(&[0x11, 0x22])).unwrap();

        let path = write_vectors(&dir.path().join("nested"), &vectors).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(json["root"], vectors.root.to_string());
        assert_eq!(json["claims"].as_array().unwrap().len(), 2);
        assert_eq!(json["claims"][0]["expected_valid"], true);
        assert_eq!(json["invalid_claims"][0]["expected_valid"], false);
    }
}
