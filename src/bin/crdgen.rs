// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Writes the `ServiceImport` CRD consumed by kubedns to deploy/crds/, for
//! clusters that do not already run a Multi-Cluster Services implementation.
//!
//! Usage:
//!   cargo run --bin crdgen

use kube::CustomResourceExt;
use kubedns::crd::ServiceImport;
use serde_json::Value;
use std::fs;
use std::path::Path;

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd.rs
# DO NOT EDIT MANUALLY - Run `cargo run --bin crdgen` to regenerate
#
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("deploy/crds");
    fs::create_dir_all(output_dir)?;

    println!("Generating CRD YAML files from src/crd.rs...");
    generate_crd::<ServiceImport>("serviceimports.crd.yaml", output_dir)?;
    println!("✓ Successfully generated CRD YAML files in deploy/crds/");

    Ok(())
}

fn generate_crd<T>(filename: &str, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>>
where
    T: CustomResourceExt,
{
    let mut crd_json: Value = serde_json::to_value(T::crd())?;

    // kubedns only reads imports; they are written by the MCS controller
    if let Some(version) = crd_json["spec"]["versions"]
        .as_array_mut()
        .and_then(|versions| versions.first_mut())
    {
        version["served"] = Value::Bool(true);
        version["storage"] = Value::Bool(true);
    }

    let yaml = serde_yaml::to_string(&crd_json)?;
    let content = format!("{COPYRIGHT_HEADER}{yaml}");

    let output_path = output_dir.join(filename);
    fs::write(&output_path, content)?;
    println!("  ✓ Generated {filename}");

    Ok(())
}
