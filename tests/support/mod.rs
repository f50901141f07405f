//! Scripted in-process FTP server for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use rax_ftp_client::ClientConfig;

const DATA_ACCEPT_TIMEOUT: Duration = Duration::from_millis(500);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// How the mock server answers.
#[derive(Clone)]
pub struct Script {
    /// Sent verbatim (CRLF appended) on connect.
    pub banner: String,
    /// `None` lets USER log in without PASS.
    pub password: Option<String>,
    /// Empty means FEAT is not implemented.
    pub features: Vec<String>,
    /// Replaces the generated PASV reply.
    pub pasv_reply: Option<String>,
    /// Replaces the `200` answer to PRET.
    pub pret_reply: Option<String>,
    /// Directory reported by PWD.
    pub home: String,
    pub listing: Vec<String>,
    pub directories: Vec<String>,
    pub forbidden_mkd: Vec<String>,
    /// Accept connections but never say anything.
    pub silent: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            banner: "220 mock FTP ready".to_string(),
            password: Some("secret".to_string()),
            features: Vec::new(),
            pasv_reply: None,
            pret_reply: None,
            home: "/".to_string(),
            listing: Vec::new(),
            directories: vec!["/".to_string()],
            forbidden_mkd: Vec::new(),
            silent: false,
        }
    }
}

#[derive(Default)]
struct Recorded {
    commands: Vec<String>,
    connections: usize,
    uploads: Vec<(String, Vec<u8>)>,
}

pub struct MockServer {
    port: u16,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockServer {
    pub async fn start(script: Script) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let directories: HashSet<String> = script.directories.iter().cloned().collect();
        let directories = Arc::new(Mutex::new(directories));

        let shared = Arc::clone(&recorded);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                shared.lock().unwrap().connections += 1;
                tokio::spawn(serve(
                    stream,
                    script.clone(),
                    Arc::clone(&shared),
                    Arc::clone(&directories),
                ));
            }
        });

        MockServer { port, recorded }
    }

    /// Client configuration pointing at this server with short timeouts.
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new("127.0.0.1", self.port, "alice", "secret")
            .with_timeout(Duration::from_secs(2))
    }

    pub fn commands(&self) -> Vec<String> {
        self.recorded.lock().unwrap().commands.clone()
    }

    /// Commands whose verb is `verb`.
    pub fn count(&self, verb: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(verb))
            .count()
    }

    pub fn position(&self, command: &str) -> Option<usize> {
        self.commands().iter().position(|c| c == command)
    }

    pub fn connections(&self) -> usize {
        self.recorded.lock().unwrap().connections
    }

    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.recorded.lock().unwrap().uploads.clone()
    }
}

async fn serve(
    stream: TcpStream,
    script: Script,
    recorded: Arc<Mutex<Recorded>>,
    directories: Arc<Mutex<HashSet<String>>>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    if script.silent {
        let mut sink = Vec::new();
        let _ = reader.read_to_end(&mut sink).await;
        return;
    }

    if write_half
        .write_all(format!("{}\r\n", script.banner).as_bytes())
        .await
        .is_err()
    {
        return;
    }

    let mut passive: Option<TcpListener> = None;
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let command = line.trim_end().to_string();
        recorded.lock().unwrap().commands.push(command.clone());
        let mut parts = command.splitn(2, ' ');
        let verb = parts.next().unwrap_or("").to_ascii_uppercase();
        let arg = parts.next().unwrap_or("").to_string();

        let reply = match verb.as_str() {
            "USER" => match script.password {
                Some(_) => "331 Password required".to_string(),
                None => "230 Logged in".to_string(),
            },
            "PASS" => {
                if script.password.as_deref() == Some(arg.as_str()) {
                    "230 Logged in".to_string()
                } else {
                    "530 Login incorrect".to_string()
                }
            }
            "FEAT" if script.features.is_empty() => "502 Command not implemented".to_string(),
            "FEAT" => {
                let mut text = "211-Features:\r\n".to_string();
                for feature in &script.features {
                    text.push_str(&format!(" {}\r\n", feature));
                }
                text.push_str("211 End");
                text
            }
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let port = listener.local_addr().unwrap().port();
                passive = Some(listener);
                script.pasv_reply.clone().unwrap_or_else(|| {
                    format!(
                        "227 Entering Passive Mode (127,0,0,1,{},{}).",
                        port >> 8,
                        port & 0xff
                    )
                })
            }
            "PRET" => script
                .pret_reply
                .clone()
                .unwrap_or_else(|| "200 Ready for transfer".to_string()),
            "PWD" => format!("257 \"{}\" is the current directory", script.home),
            "SITE" if arg.eq_ignore_ascii_case("IDLE") => {
                // Answer, then time the session out and hang up.
                let _ = write_half.write_all(b"200 Going idle\r\n").await;
                tokio::time::sleep(Duration::from_millis(50)).await;
                let _ = write_half.write_all(b"421 Idle timeout\r\n").await;
                break;
            }
            "LIST" | "MLSD" => match passive.take() {
                Some(listener) => {
                    let _ = write_half.write_all(b"150 Here comes the listing\r\n").await;
                    match timeout(DATA_ACCEPT_TIMEOUT, listener.accept()).await {
                        Ok(Ok((mut data, _))) => {
                            for entry in &script.listing {
                                let _ = data.write_all(format!("{}\r\n", entry).as_bytes()).await;
                            }
                            let _ = data.shutdown().await;
                            "226 Transfer complete".to_string()
                        }
                        _ => "425 Can't open data connection".to_string(),
                    }
                }
                None => "425 Use PASV first".to_string(),
            },
            "MLST" => format!("250-Listing {}\r\n type=dir;perm=el; {}\r\n250 End", arg, arg),
            "CWD" => {
                if directories.lock().unwrap().contains(&arg) {
                    "250 Directory changed".to_string()
                } else {
                    "550 No such directory".to_string()
                }
            }
            "MKD" => {
                if script.forbidden_mkd.contains(&arg) {
                    "550 Permission denied".to_string()
                } else {
                    directories.lock().unwrap().insert(arg.clone());
                    format!("257 \"{}\" created", arg)
                }
            }
            "STOR" => match passive.take() {
                Some(listener) => {
                    let _ = write_half.write_all(b"150 Ok to send data\r\n").await;
                    match timeout(DATA_ACCEPT_TIMEOUT, listener.accept()).await {
                        Ok(Ok((mut data, _))) => {
                            let mut received = Vec::new();
                            let _ = data.read_to_end(&mut received).await;
                            recorded.lock().unwrap().uploads.push((arg.clone(), received));
                            "226 Transfer complete".to_string()
                        }
                        _ => "425 Can't open data connection".to_string(),
                    }
                }
                None => "425 Use PASV first".to_string(),
            },
            "QUIT" => {
                let _ = write_half.write_all(b"221 Goodbye\r\n").await;
                break;
            }
            _ => "502 Command not implemented".to_string(),
        };

        if write_half
            .write_all(format!("{}\r\n", reply).as_bytes())
            .await
            .is_err()
        {
            break;
        }
    }
}
