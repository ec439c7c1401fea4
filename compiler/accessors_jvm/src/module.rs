//! `.kotlin_module` descriptor.
//!
//! The Kotlin compiler only looks for top-level declarations in file facades
//! that a module descriptor on the classpath lists. The descriptor is a
//! version header followed by a `Module` message:
//!
//! ```text
//! ┌──────────┬──────────────────┬────────────────────────────────────┐
//! │ count:i4 │ version:i4 × cnt │ Module { PackageParts* } (protobuf) │
//! └──────────┴──────────────────┴────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use accessors_ir::InternalName;

use crate::bytes::ByteWriter;
use crate::metadata::protobuf::ProtoWriter;
use crate::metadata::METADATA_VERSION;

/// Module the accessors are registered under.
pub const DEFAULT_MODULE_NAME: &str = "kotlin-dsl-plugin-spec-accessors";

// Module
const MODULE_PACKAGE_PARTS: u32 = 1;

// PackageParts
const PACKAGE_FQ_NAME: u32 = 1;
const PACKAGE_SHORT_CLASS_NAME: u32 = 2;

/// `<bin_dir>/META-INF/<module_name>.kotlin_module`
pub fn module_file_for(bin_dir: &Path, module_name: &str) -> PathBuf {
    bin_dir
        .join("META-INF")
        .join(format!("{module_name}.kotlin_module"))
}

/// Descriptor listing `file_facades`, grouped by package in first-seen order.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn module_metadata_bytes_for(file_facades: &[InternalName]) -> Vec<u8> {
    let mut packages: Vec<(String, Vec<&str>)> = Vec::new();
    for facade in file_facades {
        let package = facade.package_path().replace('/', ".");
        let short_name = facade.simple_name();
        match packages.iter_mut().find(|(name, _)| *name == package) {
            Some((_, parts)) => parts.push(short_name),
            None => packages.push((package, vec![short_name])),
        }
    }

    let mut module = ProtoWriter::new();
    for (package, parts) in &packages {
        let mut package_parts = ProtoWriter::new();
        package_parts.string_field(PACKAGE_FQ_NAME, package);
        for part in parts {
            package_parts.string_field(PACKAGE_SHORT_CLASS_NAME, part);
        }
        module.message_field(MODULE_PACKAGE_PARTS, package_parts);
    }

    let mut out = ByteWriter::new();
    out.write_i32(METADATA_VERSION.len() as i32);
    for version in METADATA_VERSION {
        out.write_i32(version);
    }
    out.write_bytes(&module.finish());
    out.finish()
}
