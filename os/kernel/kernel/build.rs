use kernel_info::memory;
use std::{env, path::PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("set by cargo"));
    let ld = manifest_dir.join("kernel.ld");

    let kernel_load = memory::KERNEL_LOAD;
    assert_eq!(
        kernel_load & (memory::PAGE_SIZE - 1),
        0,
        "KERNEL_LOAD must be page aligned (got {kernel_load:#x})"
    );

    println!("cargo:rerun-if-changed={}", ld.display());
    println!("cargo:rustc-link-arg-bins=-T{}", ld.display());

    // The script places the image at KERNEL_LOAD and exports its bounds.
    println!("cargo:rustc-link-arg-bins=--defsym=KERNEL_LOAD={kernel_load:#x}");
}
