use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;
use serialport::SerialPort;
use touchpad_core::config::DEBUG_COMMAND;

/// Read timeout per poll; lets the duration check run on a quiet line.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

pub struct Monitor {
    port: Box<dyn SerialPort>,
    output: Option<File>,
}

impl Monitor {
    pub fn open(port: &str, baud: u32, output_path: Option<&Path>) -> Result<Self> {
        let serial = serialport::new(port, baud)
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("failed to open serial port {port} @ {baud}"))?;

        let output = match output_path {
            Some(path) => Some(
                File::create(path).with_context(|| format!("creating {}", path.display()))?,
            ),
            None => None,
        };

        Ok(Self {
            port: serial,
            output,
        })
    }

    /// Send the command that toggles the device's debug trace.
    pub fn toggle_debug(&mut self) -> Result<()> {
        self.port
            .write_all(DEBUG_COMMAND)
            .context("writing debug command")?;
        self.port.flush()?;
        info!("sent debug toggle");
        Ok(())
    }

    /// Copy device output to stdout (and the capture file) until `duration`
    /// elapses, or forever.
    pub fn run(&mut self, duration: Option<Duration>) -> Result<()> {
        let started = Instant::now();
        let stdout = io::stdout();
        let mut buf = [0u8; 256];

        while duration.map_or(true, |d| started.elapsed() < d) {
            let n = match self.port.read(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e).context("reading serial port"),
            };

            let mut out = stdout.lock();
            out.write_all(&buf[..n])?;
            out.flush()?;
            if let Some(file) = self.output.as_mut() {
                file.write_all(&buf[..n]).context("writing capture file")?;
            }
        }

        Ok(())
    }
}
