//! A scripted single-connection SMTP server for driving `EmailClient`.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

#[derive(Debug, Default, Clone)]
pub struct Script {
    /// Recipients answered with `(code, text)` instead of `250`
    pub refuse: HashMap<String, (u16, String)>,
    pub reject_auth: bool,
    pub starttls: bool,
}

impl Script {
    pub fn refuse(mut self, recipient: &str, code: u16, text: &str) -> Self {
        self.refuse
            .insert(recipient.to_string(), (code, text.to_string()));
        self
    }
}

#[derive(Debug, Default)]
pub struct Transcript {
    /// Every command line the client sent, without the CRLF
    pub commands: Vec<String>,
    /// The DATA payload, dot line excluded
    pub data: String,
}

impl Transcript {
    pub fn has_command(&self, prefix: &str) -> bool {
        self.commands.iter().any(|c| c.starts_with(prefix))
    }
}

#[derive(Debug)]
pub struct MockSmtp {
    pub addr: SocketAddr,
    handle: JoinHandle<Transcript>,
}

impl MockSmtp {
    pub fn start(script: Script) -> MockSmtp {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream, &script)
        });
        MockSmtp { addr, handle }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the client to hang up and return what it sent.
    pub fn transcript(self) -> Transcript {
        self.handle.join().unwrap()
    }
}

fn recipient_of(command: &str) -> String {
    let start = command.find('<').map(|i| i + 1).unwrap_or(0);
    let end = command.find('>').unwrap_or(command.len());
    command[start..end].to_string()
}

fn reply(writer: &mut TcpStream, text: &str) {
    let _ = writer.write_all(text.as_bytes());
    let _ = writer.flush();
}

fn serve(stream: TcpStream, script: &Script) -> Transcript {
    let mut transcript = Transcript::default();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;
    reply(&mut writer, "220 mock ESMTP ready\r\n");

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let command = line.trim_end_matches(&['\r', '\n'][..]).to_string();
        transcript.commands.push(command.clone());
        let upper = command.to_ascii_uppercase();

        if upper.starts_with("EHLO") {
            if script.starttls {
                reply(&mut writer, "250-mock\r\n250-STARTTLS\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n");
            } else {
                reply(&mut writer, "250-mock\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n");
            }
        } else if upper == "STARTTLS" {
            reply(&mut writer, "454 4.7.0 TLS not available\r\n");
        } else if upper.starts_with("AUTH") {
            if script.reject_auth {
                reply(&mut writer, "535 5.7.8 Authentication credentials invalid\r\n");
            } else {
                reply(&mut writer, "235 2.7.0 Authentication successful\r\n");
            }
        } else if upper.starts_with("MAIL FROM") {
            reply(&mut writer, "250 2.1.0 OK\r\n");
        } else if upper.starts_with("RCPT TO") {
            match script.refuse.get(&recipient_of(&command)) {
                Some((code, text)) => reply(&mut writer, &format!("{} {}\r\n", code, text)),
                None => reply(&mut writer, "250 2.1.5 OK\r\n"),
            }
        } else if upper == "DATA" {
            reply(&mut writer, "354 End data with <CR><LF>.<CR><LF>\r\n");
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => return transcript,
                    Ok(_) => {}
                }
                if line == ".\r\n" {
                    break;
                }
                transcript.data.push_str(&line);
            }
            reply(&mut writer, "250 2.0.0 Queued\r\n");
        } else if upper == "QUIT" {
            reply(&mut writer, "221 2.0.0 Bye\r\n");
            break;
        } else if upper == "RSET" || upper == "NOOP" {
            reply(&mut writer, "250 2.0.0 OK\r\n");
        } else {
            reply(&mut writer, "502 5.5.2 Command not recognized\r\n");
        }
    }

    transcript
}
