//! MistChat - layered-encryption chat
//!
//! CLI front end for the MistChat library: accounts, text messages through
//! the three-layer pipeline, encrypted file transfer, and steganographic
//! image messages.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use mistchat::chat::ChatSession;
use mistchat::client::models::MessageKind;
use mistchat::client::ApiClient;
use mistchat::crypto::{hash_password, verify_password, vigenere};
use mistchat::pipeline::FileCipher;
use mistchat::usb::{self, TokenRegistry};
use mistchat::{stego, TextDecryption};

/// Default remote store.
const DEFAULT_SERVER: &str = "https://morsz.azeroth.site";

/// MistChat - layered-encryption chat
///
/// Text messages pass through a keyed substitution cipher, the White-Mist
/// string cipher, and a scrypt/AES-GCM session layer. Files take a single
/// user-selected cipher; images can carry hidden text in their pixels.
#[derive(Parser)]
#[command(name = "mistchat")]
#[command(version = "0.3.0")]
#[command(about = "Layered-encryption chat client")]
struct Cli {
    /// Remote store base URL
    #[arg(long, global = true, default_value = DEFAULT_SERVER)]
    server: String,

    /// Local data directory (display caches, downloaded media)
    #[arg(long, global = true, default_value = "mistchat_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FileMethod {
    /// scrypt + AES-256-GCM envelope
    Aes,
    /// White-Mist stream cipher (experimental)
    Whitemist,
}

impl From<FileMethod> for FileCipher {
    fn from(method: FileMethod) -> Self {
        match method {
            FileMethod::Aes => FileCipher::Aes,
            FileMethod::Whitemist => FileCipher::Whitemist,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account (only a PBKDF2 salt/hash pair leaves the machine)
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },

    /// Verify an account password against the stored record
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },

    /// List contacts you share a chat with
    Contacts {
        #[arg(short, long)]
        username: String,
    },

    /// Send a text message through the full pipeline
    Send {
        /// Your username
        #[arg(short, long)]
        user: String,
        /// Recipient username
        #[arg(short, long)]
        to: String,
        /// Message text
        message: String,
        /// Per-message key for the inner layers (empty uses the default key)
        #[arg(short, long, default_value = "")]
        key: String,
    },

    /// Show chat history, decrypting text messages when a key is given
    History {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        with: String,
        /// Per-message key; without it, only cached text is shown
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Encrypt and send a file
    SendFile {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        to: String,
        /// File to encrypt and upload
        path: PathBuf,
        /// Encryption key for this file
        #[arg(short, long)]
        key: String,
        /// Cipher to apply (exactly one; never both)
        #[arg(short, long, value_enum, default_value = "aes")]
        method: FileMethod,
    },

    /// Download and decrypt a file message
    FetchFile {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        with: String,
        /// File id from the message record
        #[arg(long)]
        file_id: String,
        /// Decryption key
        #[arg(short, long)]
        key: String,
        /// Output path (defaults to DECRYPTED_<filename>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Hide text in a carrier image (local, no upload)
    Hide {
        /// Carrier image (lossless format)
        carrier: PathBuf,
        /// Text to hide
        message: String,
        /// Substitution key
        #[arg(short, long, default_value = "")]
        key: String,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Reveal text hidden in an image (local)
    Reveal {
        image: PathBuf,
        #[arg(short, long, default_value = "")]
        key: String,
    },

    /// Hide text in an image and send it as a stegano message
    SendImage {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        to: String,
        /// Carrier image (lossless format)
        carrier: PathBuf,
        /// Text to hide
        message: String,
        #[arg(short, long, default_value = "")]
        key: String,
    },

    /// Download a stegano message's image and reveal its text
    RevealImage {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        with: String,
        #[arg(long)]
        file_id: String,
        #[arg(short, long, default_value = "")]
        key: String,
    },

    /// Run the substitution cipher on its own
    Vigenere {
        text: String,
        #[arg(short, long)]
        key: String,
        /// Decode instead of encode
        #[arg(short, long)]
        decode: bool,
        /// Evaluate on the remote endpoint instead of locally
        #[arg(long)]
        remote: bool,
    },

    /// Manage the sealed USB token registry
    #[command(subcommand)]
    Usb(UsbCommands),
}

#[derive(Subcommand)]
enum UsbCommands {
    /// Register a token value in the sealed registry
    Setup {
        /// Token value (the content of the drive's key file)
        token: String,
        /// Registry file path
        #[arg(short, long, default_value = "auth/auth.config")]
        config: PathBuf,
        /// Registry master secret
        #[arg(long, default_value = usb::DEFAULT_MASTER_SECRET)]
        master: String,
    },

    /// Check whether a registered token is present on any given mount
    Check {
        /// Candidate mount points to scan
        #[arg(required = true)]
        mounts: Vec<PathBuf>,
        #[arg(short, long, default_value = "auth/auth.config")]
        config: PathBuf,
        #[arg(long, default_value = usb::DEFAULT_MASTER_SECRET)]
        master: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let api = ApiClient::new(&cli.server)?;

    match cli.command {
        Commands::Register { username, password } => {
            let (salt_hex, hash_hex) = hash_password(&password);
            api.register(&username, &salt_hex, &hash_hex)?;
            println!("Account '{username}' created.");
        }

        Commands::Login { username, password } => {
            let record = api
                .fetch_credentials(&username)
                .context("login challenge failed")?;
            if verify_password(&record.salt_hex, &record.hash_hex, &password) {
                println!("Login OK.");
            } else {
                bail!("wrong password for '{username}'");
            }
        }

        Commands::Contacts { username } => {
            for contact in api.contacts(&username)? {
                println!("{contact}");
            }
        }

        Commands::Send { user, to, message, key } => {
            let mut session = ChatSession::open(&user, &to, api, &cli.data_dir);
            session.send_text(&message, &key)?;
            println!("Sent to {to}.");
        }

        Commands::History { user, with, key } => {
            let mut session = ChatSession::open(&user, &with, api, &cli.data_dir);
            let messages = session.fetch_messages()?;
            if messages.is_empty() {
                println!("(no messages)");
            }
            for msg in &messages {
                let who = if msg.sender == user { "you" } else { msg.sender.as_str() };
                let when = msg.timestamp.as_deref().unwrap_or("-");
                match msg.kind {
                    MessageKind::Text => {
                        let line = match &key {
                            Some(k) => match session.decrypt_message(msg, k)? {
                                TextDecryption::Clean(text) => text,
                                TextDecryption::Degraded(text) => {
                                    format!("[degraded] {text}")
                                }
                            },
                            None => session
                                .cached(msg)
                                .map(|entry| {
                                    if entry.degraded {
                                        format!("[degraded] {}", entry.text)
                                    } else {
                                        entry.text.clone()
                                    }
                                })
                                .unwrap_or_else(|| "[encrypted text]".to_string()),
                        };
                        println!("[{when}] {who}: {line}");
                    }
                    MessageKind::File => {
                        println!(
                            "[{when}] {who}: [file {} method={} id={}]",
                            msg.filename.as_deref().unwrap_or("?"),
                            msg.encryption_method
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| "?".to_string()),
                            msg.file_id.as_deref().unwrap_or("?"),
                        );
                    }
                    MessageKind::Stegano => {
                        println!(
                            "[{when}] {who}: [stegano image {} id={}]",
                            msg.filename.as_deref().unwrap_or("?"),
                            msg.file_id.as_deref().unwrap_or("?"),
                        );
                    }
                }
            }
        }

        Commands::SendFile { user, to, path, key, method } => {
            let bytes = fs::read(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_string());

            let mut session = ChatSession::open(&user, &to, api, &cli.data_dir);
            let message = session.send_file(&bytes, &filename, &key, method.into())?;
            println!(
                "Uploaded '{filename}' as {}.",
                message.file_id.as_deref().unwrap_or("?")
            );
        }

        Commands::FetchFile { user, with, file_id, key, output } => {
            let session = ChatSession::open(&user, &with, api, &cli.data_dir);
            let messages = session.fetch_messages()?;
            let message = messages
                .iter()
                .find(|m| m.kind == MessageKind::File && m.file_id.as_deref() == Some(&*file_id))
                .with_context(|| format!("no file message with id {file_id}"))?;

            let bytes = session.open_file(message, &key)?;
            let out = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "DECRYPTED_{}",
                    message.filename.as_deref().unwrap_or("file")
                ))
            });
            fs::write(&out, bytes)?;
            println!("Decrypted to {}.", out.display());
        }

        Commands::Hide { carrier, message, key, output } => {
            let carrier_bytes = fs::read(&carrier)
                .with_context(|| format!("cannot read {}", carrier.display()))?;
            let png = stego::hide(&carrier_bytes, &message, &key)?;
            fs::write(&output, png)?;
            println!("Hidden message written to {}.", output.display());
        }

        Commands::Reveal { image, key } => {
            let image_bytes = fs::read(&image)
                .with_context(|| format!("cannot read {}", image.display()))?;
            println!("{}", stego::reveal(&image_bytes, &key)?);
        }

        Commands::SendImage { user, to, carrier, message, key } => {
            let carrier_bytes = fs::read(&carrier)
                .with_context(|| format!("cannot read {}", carrier.display()))?;
            let filename = carrier
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image.png".to_string());

            let mut session = ChatSession::open(&user, &to, api, &cli.data_dir);
            let sent = session.send_hidden_image(&carrier_bytes, &filename, &message, &key)?;
            println!(
                "Stegano image sent as {}.",
                sent.file_id.as_deref().unwrap_or("?")
            );
        }

        Commands::RevealImage { user, with, file_id, key } => {
            let mut session = ChatSession::open(&user, &with, api, &cli.data_dir);
            let messages = session.fetch_messages()?;
            let message = messages
                .iter()
                .find(|m| {
                    m.kind == MessageKind::Stegano && m.file_id.as_deref() == Some(&*file_id)
                })
                .with_context(|| format!("no stegano message with id {file_id}"))?
                .clone();

            println!("{}", session.reveal_hidden_image(&message, &key)?);
        }

        Commands::Vigenere { text, key, decode, remote } => {
            let result = match (remote, decode) {
                (false, false) => vigenere::encode(&text, &key),
                (false, true) => vigenere::decode(&text, &key),
                (true, false) => api.remote_vigenere_encrypt(&text, &key)?,
                (true, true) => api.remote_vigenere_decrypt(&text, &key)?,
            };
            println!("{result}");
        }

        Commands::Usb(cmd) => match cmd {
            UsbCommands::Setup { token, config, master } => {
                let mut registry = TokenRegistry::load(&config, &master)?;
                registry.register(&token);
                registry.save(&config, &master)?;
                println!("{} token(s) registered.", registry.len());
            }
            UsbCommands::Check { mounts, config, master } => {
                let registry = TokenRegistry::load(&config, &master)?;
                match usb::find_token_drive(&mounts, &registry) {
                    Some(mount) => println!("Token present at {}.", mount.display()),
                    None => bail!("no registered token present"),
                }
            }
        },
    }

    Ok(())
}
