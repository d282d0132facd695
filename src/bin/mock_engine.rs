//! Scriptable stand-in engine used by the integration tests.
//!
//! usage: mock_engine <mode>
//!
//! Modes:
//!   well-behaved  answer uci, isready and go; exit on quit
//!   silent        read stdin forever, never write
//!   unterminated  write `uciok` without a newline, then exit
//!   burst         answer isready with `readyok\ninfo string x\n` in one write
//!   trickle       answer uci one byte at a time
//!   crash         exit with status 3 after the handshake
//!   stubborn      handshake normally but ignore quit and stdin closing

use std::env;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

fn write_now(out: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    out.write_all(bytes)?;
    out.flush()
}

fn handshake(out: &mut impl Write) -> io::Result<()> {
    write_now(out, b"id name Fake\nid author Tester\n")?;
    write_now(
        out,
        b"option name Hash type spin default 16 min 1 max 1024\noption name Ponder type check default false\n",
    )?;
    write_now(out, b"uciok\n")
}

fn run(mode: &str) -> io::Result<i32> {
    let stdin = io::stdin();
    let mut out = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let command = line.split_whitespace().next().unwrap_or("");

        match (mode, command) {
            ("silent", _) => {}
            ("unterminated", "uci") => {
                write_now(&mut out, b"uciok")?;
                return Ok(0);
            }
            ("burst", "isready") => write_now(&mut out, b"readyok\ninfo string x\n")?,
            ("trickle", "uci") => {
                for byte in b"id name Fake\nuciok\n" {
                    write_now(&mut out, &[*byte])?;
                    thread::sleep(Duration::from_millis(1));
                }
            }
            ("crash", "uci") => {
                handshake(&mut out)?;
                thread::sleep(Duration::from_millis(20));
                return Ok(3);
            }
            (_, "uci") => handshake(&mut out)?,
            (_, "isready") => write_now(&mut out, b"readyok\n")?,
            (_, "go") => {
                write_now(&mut out, b"info depth 1 score cp 10\n")?;
                write_now(&mut out, b"info depth 2 score cp 12\n")?;
                write_now(&mut out, b"bestmove e2e4\n")?;
            }
            ("stubborn", "quit") => {}
            (_, "quit") => return Ok(0),
            _ => {}
        }
    }
    if mode == "stubborn" {
        thread::sleep(Duration::from_secs(60));
    }
    Ok(0)
}

fn main() {
    let mode = env::args().nth(1).unwrap_or_else(|| "well-behaved".to_string());
    match run(&mode) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("mock_engine: {e}");
            std::process::exit(1);
        }
    }
}
