use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_root = PathBuf::from("../proto");

    println!("cargo:rerun-if-changed=../proto/pvz/v1/");

    // Client stubs are only used by the integration tests.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(
            PathBuf::from(std::env::var("OUT_DIR")?).join("pvz_descriptor.bin"),
        )
        .compile_protos(&["../proto/pvz/v1/pvz.proto"], &[proto_root])?;

    Ok(())
}
