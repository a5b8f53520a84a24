// The gateway only consumes these services; no server code is generated.
fn main() {
    println!("cargo:rerun-if-changed=../proto/services/identity_service.proto");
    println!("cargo:rerun-if-changed=../proto/services/course_access.proto");

    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(
            &[
                "../proto/services/identity_service.proto",
                "../proto/services/course_access.proto",
            ],
            &["../proto/services"],
        )
        .expect("Failed to compile protos for api-gateway");
}
