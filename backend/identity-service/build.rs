// Compiles identity_service.proto for the AuthService server.
// Client code is generated as well for the integration tests.
fn main() {
    println!("cargo:rerun-if-changed=../proto/services/identity_service.proto");

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &["../proto/services/identity_service.proto"],
            &["../proto/services"],
        )
        .expect("Failed to compile identity_service.proto for identity-service");
}
