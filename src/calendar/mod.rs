mod event;

pub use event::{
    EventStatus, MeetingEvent, RawAttendee, RawEvent, RawEventTime, RawOrganizer, format_meeting,
};
