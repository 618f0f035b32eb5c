//! Build script for splitr
//!
//! Compiles the CUDA kernels to PTX when the `cuda` feature is enabled. The
//! PTX directory is exported as `CUDA_KERNEL_DIR` for the module loader.
//!
//! # Requirements
//!
//! - CUDA Toolkit (nvcc compiler)
//! - Compute Capability 7.5+ (Turing architecture, sm_75)
//!
//! # Environment Variables
//!
//! - `CUDA_PATH`: Custom CUDA installation path (optional)

fn main() {
    #[cfg(feature = "cuda")]
    compile_cuda_kernels();
}

#[cfg(feature = "cuda")]
const KERNEL_FILES: &[&str] = &["split.cu", "strided_copy.cu"];

#[cfg(feature = "cuda")]
fn compile_cuda_kernels() {
    use std::env;
    use std::path::PathBuf;
    use std::process::Command;

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let kernels_dir = PathBuf::from("src/runtime/cuda/kernels");

    println!("cargo:rerun-if-env-changed=CUDA_PATH");

    let nvcc = find_nvcc().unwrap_or_else(|| {
        panic!(
            "nvcc not found: the 'cuda' feature needs the CUDA Toolkit.\n\
             Add nvcc to PATH or set CUDA_PATH (e.g. export CUDA_PATH=/usr/local/cuda)."
        )
    });

    for kernel_file in KERNEL_FILES {
        let cu_path = kernels_dir.join(kernel_file);
        let ptx_path = out_dir.join(kernel_file.replace(".cu", ".ptx"));

        println!("cargo:rerun-if-changed={}", cu_path.display());

        if !cu_path.exists() {
            panic!("CUDA kernel source not found: {}", cu_path.display());
        }

        // Kernels only move bits, so no fast-math flags.
        let output = Command::new(&nvcc)
            .arg("-ptx")
            .arg("-O3")
            .arg("-arch=sm_75")
            .arg("-o")
            .arg(&ptx_path)
            .arg(&cu_path)
            .output()
            .unwrap_or_else(|e| panic!("failed to execute {}: {}", nvcc, e));

        if !output.status.success() {
            panic!(
                "nvcc compilation failed for {}\nstdout:\n{}\nstderr:\n{}",
                kernel_file,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
    }

    println!("cargo:rustc-env=CUDA_KERNEL_DIR={}", out_dir.display());
}

#[cfg(feature = "cuda")]
fn find_nvcc() -> Option<String> {
    use std::path::{Path, PathBuf};
    use std::process::Command;

    if let Ok(cuda_path) = std::env::var("CUDA_PATH") {
        for exe in ["nvcc", "nvcc.exe"] {
            let nvcc = PathBuf::from(&cuda_path).join("bin").join(exe);
            if nvcc.exists() {
                return Some(nvcc.to_string_lossy().into_owned());
            }
        }
    }

    let common_paths = [
        "/usr/local/cuda/bin/nvcc",
        "/usr/local/cuda-12/bin/nvcc",
        "/opt/cuda/bin/nvcc",
    ];
    if let Some(path) = common_paths.iter().find(|p| Path::new(p).exists()) {
        return Some(path.to_string());
    }

    Command::new("nvcc")
        .arg("--version")
        .output()
        .ok()
        .map(|_| "nvcc".to_string())
}
