//! Resampling finger tracks into a frame-synchronized pointer matrix.

use std::time::Duration;

use uiauto_core_types::{Point, PointerFrames};

use crate::errors::ActionError;
use crate::types::{
    PinchDirection, TimedPoint, EXTRA_FRAMES, FRAMES_PER_SECOND, FRAME_INTERVAL, MAX_FINGERS,
    PINCH_MIN_OFFSET,
};

/// Number of frames covering `end_time` seconds. Saturates instead of
/// overflowing.
pub fn frame_count(end_time: f64) -> usize {
    ((end_time.max(0.0) * FRAMES_PER_SECOND) as usize).saturating_add(EXTRA_FRAMES)
}

/// Every finger gets one position per frame. A finger holds its current
/// sample until the frame clock passes that sample's time, then steps to
/// the next one. Gestures longer than `max_duration` are rejected before
/// anything is allocated.
pub fn synthesize(
    fingers: &[Vec<TimedPoint>],
    max_duration: Duration,
) -> Result<PointerFrames, ActionError> {
    if fingers.is_empty() {
        return Err(ActionError::InvalidArgument(
            "gesture needs at least one finger".to_string(),
        ));
    }
    if fingers.len() > MAX_FINGERS {
        return Err(ActionError::InvalidArgument(format!(
            "gesture uses {} fingers, at most {MAX_FINGERS} are supported",
            fingers.len()
        )));
    }
    if let Some(i) = fingers.iter().position(Vec::is_empty) {
        return Err(ActionError::InvalidArgument(format!(
            "finger {i} has no touch samples"
        )));
    }
    let times = fingers.iter().flat_map(|samples| samples.iter().map(|s| s.time));
    if let Some(bad) = times.clone().find(|t| !t.is_finite() || *t < 0.0) {
        return Err(ActionError::InvalidArgument(format!(
            "touch sample time {bad} must be a non-negative number of seconds"
        )));
    }

    let end_time = times.fold(0.0_f64, f64::max);
    if end_time > max_duration.as_secs_f64() {
        return Err(ActionError::InvalidArgument(format!(
            "gesture of {end_time}s exceeds the limit of {}s",
            max_duration.as_secs_f64()
        )));
    }
    let frames = frame_count(end_time);
    let step = FRAME_INTERVAL.as_secs_f64();

    let pointers = fingers
        .iter()
        .map(|samples| {
            let mut current = 0;
            (0..frames)
                .map(|frame| {
                    let now = frame as f64 * step;
                    if now > samples[current].time && current + 1 < samples.len() {
                        current += 1;
                    }
                    samples[current].point
                })
                .collect()
        })
        .collect();
    Ok(PointerFrames::new(pointers, FRAME_INTERVAL))
}

/// Two fingers on a horizontal line through `center`, `reach` pixels out at
/// their widest, meeting `PINCH_MIN_OFFSET` pixels from the center.
pub fn pinch(center: Point, reach: f64, direction: PinchDirection, steps: u32) -> PointerFrames {
    let steps = steps.max(1);
    let reach = reach.max(PINCH_MIN_OFFSET);
    let (from, to) = match direction {
        PinchDirection::In => (reach, PINCH_MIN_OFFSET),
        PinchDirection::Out => (PINCH_MIN_OFFSET, reach),
    };
    let offsets: Vec<f64> = (0..=steps)
        .map(|i| from + (to - from) * f64::from(i) / f64::from(steps))
        .collect();
    let left = offsets.iter().map(|d| center.offset(-d, 0.0)).collect();
    let right = offsets.iter().map(|d| center.offset(*d, 0.0)).collect();
    PointerFrames::new(vec![left, right], FRAME_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(60);

    #[test]
    fn two_second_swipe_covers_the_whole_track() {
        let track = vec![
            TimedPoint::new(0.0, Point::new(100.0, 500.0)),
            TimedPoint::new(1.0, Point::new(100.0, 300.0)),
            TimedPoint::new(2.0, Point::new(100.0, 100.0)),
        ];
        let frames = synthesize(&[track], LIMIT).unwrap();
        assert!(frames.frame_count() >= 400);
        assert!(frames.duration() >= Duration::from_secs(2));
        let positions = &frames.pointers[0];
        assert_eq!(positions[0], Point::new(100.0, 500.0));
        assert_eq!(positions[150], Point::new(100.0, 300.0));
        assert_eq!(*positions.last().unwrap(), Point::new(100.0, 100.0));
    }

    #[test]
    fn fingers_share_one_frame_clock() {
        let short = vec![TimedPoint::new(0.0, Point::new(1.0, 1.0))];
        let long = vec![
            TimedPoint::new(0.0, Point::new(5.0, 5.0)),
            TimedPoint::new(0.5, Point::new(9.0, 9.0)),
        ];
        let frames = synthesize(&[short, long], LIMIT).unwrap();
        assert_eq!(frames.finger_count(), 2);
        assert_eq!(frames.pointers[0].len(), frames.pointers[1].len());
        assert_eq!(frames.frame_count(), 102);
        assert!(frames.pointers[0].iter().all(|p| *p == Point::new(1.0, 1.0)));
    }

    #[test]
    fn empty_tracks_are_rejected() {
        assert!(synthesize(&[], LIMIT).is_err());
        assert!(synthesize(&[Vec::new()], LIMIT).is_err());
    }

    #[test]
    fn oversized_or_broken_timelines_are_rejected() {
        let at = |time| vec![TimedPoint::new(time, Point::new(1.0, 1.0))];
        for time in [1e300, 1e7, 61.0, f64::INFINITY, f64::NAN, -0.5] {
            assert!(
                matches!(synthesize(&[at(time)], LIMIT), Err(ActionError::InvalidArgument(_))),
                "{time}"
            );
        }
        assert_eq!(synthesize(&[at(60.0)], LIMIT).unwrap().frame_count(), 12_002);

        let crowd: Vec<_> = (0..=MAX_FINGERS).map(|_| at(0.0)).collect();
        assert!(synthesize(&crowd, LIMIT).is_err());
    }

    #[test]
    fn frame_count_saturates() {
        assert_eq!(frame_count(1e300), usize::MAX);
        assert_eq!(frame_count(-3.0), EXTRA_FRAMES);
    }

    #[test]
    fn pinch_in_moves_fingers_together() {
        let frames = pinch(Point::new(200.0, 400.0), 100.0, PinchDirection::In, 10);
        assert_eq!(frames.finger_count(), 2);
        assert_eq!(frames.frame_count(), 11);
        assert_eq!(frames.pointers[0][0], Point::new(100.0, 400.0));
        assert_eq!(frames.pointers[1][0], Point::new(300.0, 400.0));
        assert_eq!(frames.pointers[0][10], Point::new(180.0, 400.0));
        assert_eq!(frames.pointers[1][10], Point::new(220.0, 400.0));
    }
}
