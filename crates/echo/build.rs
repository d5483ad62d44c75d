fn main() {
    std::fs::create_dir_all("src/proto").unwrap();

    protobuf_codegen::Codegen::new()
        .protoc()
        .protoc_path(&protoc_bin_vendored::protoc_bin_path().unwrap())
        .customize(protobuf_codegen::Customize::default().gen_mod_rs(true))
        .includes(&["proto"])
        .input("proto/echo.proto")
        .out_dir("src/proto")
        .run_from_script();
}
