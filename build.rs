/*
 * Copyright 2018-2020 Cargill Incorporated
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 * ------------------------------------------------------------------------------
 */

use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

const PROTO_DIR: &str = "protos";

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is not set");
    let dest_path = Path::new(&out_dir).join("protos");
    fs::create_dir_all(&dest_path).expect("Unable to create protos output directory");

    let mut proto_src_files = fs::read_dir(PROTO_DIR)
        .expect("Unable to read protos directory")
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().map(|ext| ext == "proto").unwrap_or(false))
        .collect::<Vec<_>>();
    proto_src_files.sort();

    for file in &proto_src_files {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    // Generate the mod.rs file that exposes each generated module
    let mut mod_file =
        fs::File::create(dest_path.join("mod.rs")).expect("Unable to create protos mod.rs");
    for file in &proto_src_files {
        let module = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .expect("Proto file name is not valid UTF-8");
        let module_path = dest_path.join(format!("{}.rs", module));
        writeln!(
            mod_file,
            "#[path = {:?}]\npub mod {};",
            module_path.display().to_string(),
            module
        )
        .expect("Unable to write protos mod.rs");
    }

    protobuf_codegen_pure::Codegen::new()
        .out_dir(&dest_path)
        .inputs(&proto_src_files)
        .include(PROTO_DIR)
        .run()
        .expect("Protobuf code generation failed");
}
