//! Test fixtures shared by unit tests: a mock HTTP endpoint, zip and script
//! builders.

mod mock_http;

use std::fs::File;
use std::io::Write;
use std::path::Path;

pub(crate) use mock_http::{status_body, status_response, MockHttp};

/// Write a zip at `path`; entries with `None` content are directories.
pub(crate) fn write_zip(path: &Path, entries: &[(&str, Option<&str>)]) {
    let file = File::create(path).expect("create zip");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    for (name, content) in entries {
        match content {
            Some(content) => {
                zip.start_file(*name, options).expect("start zip entry");
                zip.write_all(content.as_bytes()).expect("write zip entry");
            }
            None => {
                zip.add_directory(*name, options).expect("add zip directory");
            }
        }
    }

    zip.finish().expect("finish zip");
}

/// Write an executable `/bin/sh` script with the given body.
pub(crate) fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("make script executable");
}

/// URL of a local port nothing listens on.
pub(crate) fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe port");
    let url = format!("http://{}/node/status", listener.local_addr().expect("local addr"));
    drop(listener);
    url
}
