//! The conversation orchestrator: owns the message history and the
//! conversation state, threads each user turn through the LLM, and
//! dispatches at most one calendar/email side effect per turn.

use anyhow::Result;
use tracing::{error, warn};

use crate::calendar::{EventStatus, MeetingEvent, format_meeting};
use crate::gateway::CalendarGateway;
use crate::llm::{LlmClient, Message, Role};

use super::directive::{Directive, extract_directive};
use super::prompt;
use super::state::{Action, ConversationState};
use super::transcript::{DisplayHistory, Transcript};

/// The result of a completed chat turn.
#[derive(Debug)]
pub struct TurnReply {
    pub text: String,
    pub history: Vec<(String, String)>,
}

pub struct Orchestrator<G> {
    llm: LlmClient,
    gateway: G,
    user_name: String,
    state: ConversationState,
    transcript: Transcript,
    display: DisplayHistory,
}

impl<G: CalendarGateway> Orchestrator<G> {
    pub fn new(llm: LlmClient, gateway: G, user_name: &str) -> Self {
        let mut transcript = Transcript::new();
        transcript.push(Message::new(Role::System, prompt::SYSTEM_PROMPT));
        Self {
            llm,
            gateway,
            user_name: user_name.to_string(),
            state: ConversationState::new(),
            transcript,
            display: DisplayHistory::new(),
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn history(&self) -> Vec<(String, String)> {
        self.display.pairs()
    }

    /// Clear the conversation: drop everything but the system prompt
    /// and replace the state wholesale. The only path that resets
    /// `authenticated`.
    pub fn clear(&mut self) {
        self.transcript = Transcript::new();
        self.transcript
            .push(Message::new(Role::System, prompt::SYSTEM_PROMPT));
        self.display.clear();
        self.state.reset();
    }

    /// Run one turn of the conversation. The LLM call is the single
    /// suspension point before side-effect dispatch; if it fails the
    /// turn is discarded without committing anything to the visible
    /// history and the failure is surfaced as the chat reply.
    pub async fn next_turn(&mut self, utterance: &str) -> Result<TurnReply> {
        // Full history plus a freshly rendered state context as an
        // ephemeral system note. The context message is regenerated
        // each turn, not appended to the permanent log.
        let mut request = self.transcript.messages();
        request.push(Message::new(Role::User, utterance));
        request.push(Message::new(Role::System, &prompt::state_context(&self.state)));

        let reply = match self.llm.completion(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("LLM call failed: {}", e);
                self.state.set_error(&e.to_string());
                return Ok(TurnReply {
                    text: format!("An error occurred: {}", e),
                    history: self.display.pairs(),
                });
            }
        };

        // Commit the turn to both histories. The raw reply, directive
        // included, stays in the transcript so the model can see its
        // own prior decisions.
        self.transcript.push(Message::new(Role::User, utterance));
        self.transcript.push(Message::new(Role::Assistant, &reply));
        self.display.push_user(utterance);

        let (mut visible, directive) = extract_directive(&reply);

        if let Some(directive) = &directive
            && let Err(e) = self.state.apply(directive.state_update())
        {
            warn!("Rejected state update from directive: {}", e);
            self.state.set_error(&e.to_string());
            visible = format!("{}\n\n{}", visible, e);
        }

        // Exactly one side effect per turn, chosen by the current
        // action. A turn that didn't resolve to an action dispatches
        // nothing.
        if let Some(note) = self.dispatch(directive.as_ref()).await {
            visible = format!("{}\n\n{}", visible.trim_end(), note);
        }

        self.display.fill_reply(&visible);

        Ok(TurnReply {
            text: visible,
            history: self.display.pairs(),
        })
    }

    async fn dispatch(&mut self, directive: Option<&Directive>) -> Option<String> {
        match self.state.current_action {
            Some(Action::Authenticate) => self.dispatch_authenticate().await,
            Some(Action::GetMeetings) => self.dispatch_get_meetings().await,
            Some(Action::CancelRecurring) => self.dispatch_cancel_recurring().await,
            Some(Action::SendEmails) => {
                let custom = directive.and_then(|d| d.custom_message.clone());
                self.dispatch_send_emails(custom).await
            }
            Some(Action::ReviewMeetings) => {
                let confirmed = directive.and_then(|d| d.confirmed);
                self.review_step(confirmed)
            }
            None => None,
        }
    }

    async fn dispatch_authenticate(&mut self) -> Option<String> {
        if self.state.authenticated {
            return None;
        }
        match self.gateway.authenticate().await {
            Ok(()) => {
                self.state.authenticated = true;
                Some("Connected to your calendar successfully.".to_string())
            }
            Err(e) => {
                // current_action stays at authenticate so the next
                // turn can retry
                warn!("Authentication failed: {}", e);
                self.state.set_error(&e.to_string());
                Some(format!("Could not connect to your calendar: {}", e))
            }
        }
    }

    async fn dispatch_get_meetings(&mut self) -> Option<String> {
        // Missing preconditions make this a no-op rather than an
        // error; the orchestrator does not auto-advance.
        if !self.state.authenticated {
            return None;
        }
        let (Some(start), Some(end)) = (self.state.time_off_start, self.state.time_off_end)
        else {
            return None;
        };

        let events = match self.gateway.fetch_events(start, end).await {
            Ok(events) => events,
            Err(e) => {
                error!("Fetching events failed: {}", e);
                self.state.set_error(&e.to_string());
                self.state.current_action = None;
                return Some(format!("Could not fetch your meetings: {}", e));
            }
        };

        // A new range restarts the review from scratch
        self.state.clear_meetings();
        let mut skipped = 0;
        for raw in &events {
            let is_recurring = raw.is_recurring();
            if let Err(e) = self.state.add_event(raw, is_recurring) {
                warn!("Skipping unusable event: {}", e);
                skipped += 1;
            }
        }

        let mut note = format!(
            "Found {} recurring and {} one-off meetings between {} and {}.",
            self.state.recurring_meetings.len(),
            self.state.one_off_meetings.len(),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );
        if skipped > 0 {
            note.push_str(&format!(" Skipped {} events with incomplete details.", skipped));
        }
        Some(note)
    }

    async fn dispatch_cancel_recurring(&mut self) -> Option<String> {
        let (Some(start), Some(end)) = (self.state.time_off_start, self.state.time_off_end)
        else {
            return None;
        };

        let pending: Vec<MeetingEvent> = self
            .state
            .recurring_meetings
            .iter()
            .filter(|m| m.status == EventStatus::Pending)
            .cloned()
            .collect();
        if pending.is_empty() {
            return Some("No recurring meetings left to cancel.".to_string());
        }

        let user_email = match self.gateway.authenticated_user_email().await {
            Ok(email) => email,
            Err(e) => {
                warn!("Could not resolve the user's email: {}", e);
                String::new()
            }
        };

        let mut cancelled = 0;
        let mut notified = Vec::new();
        let mut failures = Vec::new();
        let mut notice_failures = Vec::new();
        for meeting in pending {
            match self
                .gateway
                .cancel_recurring_instances(&meeting.event_id, start, end)
                .await
            {
                Ok((true, count)) => {
                    self.state
                        .update_meeting_status(&meeting.event_id, EventStatus::Cancelled);
                    cancelled += count;

                    // Attendees get an explicit cancellation notice on
                    // top of the provider's own update emails. A failed
                    // notice never undoes the cancellation.
                    let recipients = recipients_for(&meeting, &user_email);
                    if recipients.is_empty() {
                        continue;
                    }
                    let subject = format!("Cancellation Notice: {}", meeting.summary);
                    let body = self.cancellation_body(&meeting);
                    match self.gateway.send_email(&recipients, &subject, &body).await {
                        Ok(true) => notified.push(meeting.summary.clone()),
                        Ok(false) => {
                            notice_failures.push(format!("{}: notice rejected", meeting.summary));
                        }
                        Err(e) => {
                            warn!(
                                "Sending cancellation notice for {} failed: {}",
                                meeting.event_id, e
                            );
                            notice_failures.push(format!("{}: {}", meeting.summary, e));
                        }
                    }
                }
                Ok((false, _)) => {
                    failures.push(format!("{}: not a recurring series", meeting.summary));
                }
                Err(e) => {
                    // Per-item failure: the meeting stays pending and
                    // the batch keeps going
                    warn!("Cancelling {} failed: {}", meeting.event_id, e);
                    failures.push(format!("{}: {}", meeting.summary, e));
                }
            }
        }

        let mut note = format!("Cancelled {} recurring meeting instances.", cancelled);
        if !notified.is_empty() {
            note.push_str(&format!(
                " Sent cancellation notices for: {}.",
                notified.join(", ")
            ));
        }
        if !failures.is_empty() {
            self.state
                .set_error(&format!("Failed to cancel: {}", failures.join("; ")));
            note.push_str(&format!(" Could not cancel: {}.", failures.join("; ")));
        }
        if !notice_failures.is_empty() {
            self.state
                .set_error(&format!("Failed to notify: {}", notice_failures.join("; ")));
            note.push_str(&format!(
                " Could not send notices: {}.",
                notice_failures.join("; ")
            ));
        }
        Some(note)
    }

    async fn dispatch_send_emails(&mut self, custom_message: Option<String>) -> Option<String> {
        let user_email = match self.gateway.authenticated_user_email().await {
            Ok(email) => email,
            Err(e) => {
                warn!("Could not resolve the user's email: {}", e);
                String::new()
            }
        };

        let pending: Vec<MeetingEvent> = self
            .state
            .one_off_meetings
            .iter()
            .filter(|m| m.status == EventStatus::Pending)
            .cloned()
            .collect();
        if pending.is_empty() {
            return Some("No one-off meetings left to notify.".to_string());
        }

        let mut notified = Vec::new();
        let mut failures = Vec::new();
        for meeting in pending {
            let recipients = recipients_for(&meeting, &user_email);
            if recipients.is_empty() {
                failures.push(format!("{}: no recipients", meeting.summary));
                continue;
            }
            let body = custom_message
                .clone()
                .unwrap_or_else(|| self.reschedule_body(&meeting));
            let subject = format!("Rescheduling Request: {}", meeting.summary);
            match self.gateway.send_email(&recipients, &subject, &body).await {
                Ok(true) => {
                    self.state
                        .update_meeting_status(&meeting.event_id, EventStatus::Notified);
                    notified.push(meeting.summary.clone());
                }
                Ok(false) => {
                    failures.push(format!("{}: send rejected", meeting.summary));
                }
                Err(e) => {
                    warn!("Sending email for {} failed: {}", meeting.event_id, e);
                    failures.push(format!("{}: {}", meeting.summary, e));
                }
            }
        }

        let mut note = if notified.is_empty() {
            "No rescheduling emails were sent.".to_string()
        } else {
            format!("Sent rescheduling emails for: {}.", notified.join(", "))
        };
        if !failures.is_empty() {
            self.state
                .set_error(&format!("Failed to send: {}", failures.join("; ")));
            note.push_str(&format!(" Could not send: {}.", failures.join("; ")));
        }
        Some(note)
    }

    /// Walk the one-off meeting list one meeting at a time. A yes or
    /// a no both advance the cursor; an unanswered review leaves it
    /// where it is.
    fn review_step(&mut self, confirmed: Option<bool>) -> Option<String> {
        if self.state.one_off_meetings.is_empty() {
            return Some("There are no one-off meetings to review.".to_string());
        }
        if confirmed.is_some() {
            self.state.current_meeting_index = (self.state.current_meeting_index + 1)
                .min(self.state.one_off_meetings.len());
        }
        match self
            .state
            .one_off_meetings
            .get(self.state.current_meeting_index)
        {
            Some(meeting) => Some(format!("Next meeting to review:\n{}", format_meeting(meeting))),
            None => Some("That was the last one-off meeting.".to_string()),
        }
    }

    fn email_params(&self, meeting: &MeetingEvent) -> prompt::EmailParams {
        prompt::EmailParams {
            meeting_name: meeting.summary.clone(),
            attendee_name: meeting.organizer.clone(),
            meeting_date: meeting.start_time.format("%Y-%m-%d %H:%M").to_string(),
            time_off_start: self
                .state
                .time_off_start
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            time_off_end: self
                .state
                .time_off_end
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            user_name: self.user_name.clone(),
        }
    }

    fn reschedule_body(&self, meeting: &MeetingEvent) -> String {
        let body = prompt::email_body("one_off", &self.email_params(meeting));
        // Reuse the one formatter so mail and chat describe meetings
        // identically
        format!("{}\n\nMeeting details:\n{}", body, format_meeting(meeting))
    }

    fn cancellation_body(&self, meeting: &MeetingEvent) -> String {
        let body = prompt::email_body("recurring", &self.email_params(meeting));
        format!("{}\n\nMeeting details:\n{}", body, format_meeting(meeting))
    }
}

/// Everyone on the invite minus the authenticated user, organizer
/// included, deduplicated in first-seen order.
fn recipients_for(meeting: &MeetingEvent, user_email: &str) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::new();
    for email in std::iter::once(&meeting.organizer).chain(meeting.attendees.iter()) {
        if email != user_email && !recipients.contains(email) {
            recipients.push(email.clone());
        }
    }
    recipients
}
