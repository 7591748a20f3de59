fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the vendored protoc so the build does not depend on a system install
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile(&["proto/bank.proto"], &["proto"])?;
    Ok(())
}
