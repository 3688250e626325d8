use chrono::{DateTime, Utc};

use crate::models::qr_challenge::{QrChallenge, QrStatus};
use crate::utils::token::generate_challenge_id;

const CHALLENGE_ID_LENGTH: usize = 24;

/// Result of feeding a trigger into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied { from: QrStatus, to: QrStatus },
    /// The trigger does not apply to the current state and changed nothing.
    Ignored,
}

impl Transition {
    pub fn applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

/// Identifies one pending scan verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTicket {
    pub generation: u64,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Counted(u32),
    Expired,
    Paused,
    /// The challenge this ticker belonged to is gone.
    Stale,
}

/// Lifecycle of the QR challenge shared by the pad and the phone.
///
/// Every delayed effect carries the generation (and for scans, the ticket) it
/// was scheduled under; callbacks from an older generation change nothing.
#[derive(Debug, Clone)]
pub struct QrStateMachine {
    status: QrStatus,
    challenge: Option<QrChallenge>,
    validity_secs: u32,
    generation: u64,
    scan_seq: u64,
}

impl QrStateMachine {
    pub fn new(validity_secs: u32) -> Self {
        Self {
            status: QrStatus::Idle,
            challenge: None,
            validity_secs: validity_secs.max(1),
            generation: 0,
            scan_seq: 0,
        }
    }

    pub fn status(&self) -> QrStatus {
        self.status
    }

    pub fn challenge(&self) -> Option<&QrChallenge> {
        self.challenge.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.challenge.is_some()
    }

    pub fn validity_secs(&self) -> u32 {
        self.validity_secs
    }

    /// Shows a fresh challenge, replacing any previous one.
    pub fn open_challenge(&mut self, now: DateTime<Utc>) -> Transition {
        let from = self.status;
        self.issue(now);
        Transition::Applied {
            from,
            to: self.status,
        }
    }

    /// Regenerates the displayed challenge. Not allowed once the customer has
    /// authorized, since that cycle is already being handed over to the pad.
    pub fn refresh_challenge(&mut self, now: DateTime<Utc>) -> Transition {
        if !self.is_open() || self.status == QrStatus::Authorized {
            return Transition::Ignored;
        }
        self.open_challenge(now)
    }

    pub fn close(&mut self) -> Transition {
        if !self.is_open() && self.status == QrStatus::Idle {
            return Transition::Ignored;
        }
        let from = self.status;
        self.challenge = None;
        self.status = QrStatus::Idle;
        self.generation += 1;
        self.scan_seq += 1;
        Transition::Applied {
            from,
            to: QrStatus::Idle,
        }
    }

    pub fn begin_scan(&mut self) -> Option<ScanTicket> {
        let generation = self.challenge.as_ref()?.generation;
        if self.status != QrStatus::Idle {
            return None;
        }
        self.status = QrStatus::Scanning;
        self.scan_seq += 1;
        Some(ScanTicket {
            generation,
            seq: self.scan_seq,
        })
    }

    pub fn resolve_scan(&mut self, ticket: ScanTicket, success: bool) -> Transition {
        if self.status != QrStatus::Scanning
            || !self.is_current(ticket.generation)
            || ticket.seq != self.scan_seq
        {
            return Transition::Ignored;
        }
        let to = if success {
            QrStatus::Scanned
        } else {
            QrStatus::Rejected
        };
        self.move_to(to)
    }

    /// Customer's decision on the authorization prompt. Cancelling re-arms
    /// the same challenge without issuing a new identifier.
    pub fn authorize(&mut self, confirmed: bool) -> Transition {
        if self.status != QrStatus::Scanned {
            return Transition::Ignored;
        }
        self.move_to(if confirmed {
            QrStatus::Authorized
        } else {
            QrStatus::Idle
        })
    }

    /// One-second countdown step for the challenge of `generation`.
    pub fn tick(&mut self, generation: u64) -> Tick {
        if !self.is_current(generation) {
            return Tick::Stale;
        }
        if !self.status.counts_down() {
            return Tick::Paused;
        }
        let Some(challenge) = self.challenge.as_mut() else {
            return Tick::Stale;
        };
        challenge.remaining_secs = challenge.remaining_secs.saturating_sub(1);
        if challenge.remaining_secs == 0 {
            self.status = QrStatus::Expired;
            Tick::Expired
        } else {
            Tick::Counted(challenge.remaining_secs)
        }
    }

    /// Hands an authorized challenge over: releases it and returns to idle.
    pub fn settle(&mut self, generation: u64) -> Transition {
        if self.status != QrStatus::Authorized || !self.is_current(generation) {
            return Transition::Ignored;
        }
        self.close()
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.challenge.as_ref().map(|c| c.generation)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == Some(generation)
    }

    fn issue(&mut self, now: DateTime<Utc>) {
        self.generation += 1;
        self.scan_seq += 1;
        self.status = QrStatus::Idle;
        self.challenge = Some(QrChallenge {
            id: generate_challenge_id(CHALLENGE_ID_LENGTH),
            generation: self.generation,
            created_at: now,
            remaining_secs: self.validity_secs,
        });
    }

    fn move_to(&mut self, to: QrStatus) -> Transition {
        let from = self.status;
        self.status = to;
        Transition::Applied { from, to }
    }
}
