//! Portable tag names to platform widget classes.

use crate::errors::LocatorError;

pub const BUTTON_CLASS: &str = "android.widget.Button";
pub const IMAGE_BUTTON_CLASS: &str = "android.widget.ImageButton";

/// Tags clients may never search by.
const UNALLOWED: &[&str] = &["secure"];

const CLASS_MAP: &[(&str, &str)] = &[
    ("abslist", "android.widget.AbsListView"),
    ("absseekbar", "android.widget.AbsSeekBar"),
    ("absspinner", "android.widget.AbsSpinner"),
    ("absolute", "android.widget.AbsoluteLayout"),
    ("analogclock", "android.widget.AnalogClock"),
    ("autocomplete", "android.widget.AutoCompleteTextView"),
    ("button", BUTTON_CLASS),
    ("calendar", "android.widget.CalendarView"),
    ("checkbox", "android.widget.CheckBox"),
    ("checked", "android.widget.CheckedTextView"),
    ("chronometer", "android.widget.Chronometer"),
    ("compound", "android.widget.CompoundButton"),
    ("datepicker", "android.widget.DatePicker"),
    ("digitalclock", "android.widget.DigitalClock"),
    ("drawer", "android.widget.SlidingDrawer"),
    ("expandable", "android.widget.ExpandableListView"),
    ("frame", "android.widget.FrameLayout"),
    ("gallery", "android.widget.Gallery"),
    ("grid", "android.widget.GridView"),
    ("gridlayout", "android.widget.GridLayout"),
    ("horizontal", "android.widget.HorizontalScrollView"),
    ("image", "android.widget.ImageView"),
    ("imagebutton", IMAGE_BUTTON_CLASS),
    ("imageswitcher", "android.widget.ImageSwitcher"),
    ("linear", "android.widget.LinearLayout"),
    ("list", "android.widget.ListView"),
    ("media", "android.widget.MediaController"),
    ("multiautocomplete", "android.widget.MultiAutoCompleteTextView"),
    ("numberpicker", "android.widget.NumberPicker"),
    ("progress", "android.widget.ProgressBar"),
    ("quickcontactbadge", "android.widget.QuickContactBadge"),
    ("radio", "android.widget.RadioButton"),
    ("radiogroup", "android.widget.RadioGroup"),
    ("rating", "android.widget.RatingBar"),
    ("relative", "android.widget.RelativeLayout"),
    ("row", "android.widget.TableRow"),
    ("scroll", "android.widget.ScrollView"),
    ("searchview", "android.widget.SearchView"),
    ("seek", "android.widget.SeekBar"),
    ("space", "android.widget.Space"),
    ("spinner", "android.widget.Spinner"),
    ("stack", "android.widget.StackView"),
    ("surface", "android.view.SurfaceView"),
    ("switch", "android.widget.Switch"),
    ("tabhost", "android.widget.TabHost"),
    ("tabwidget", "android.widget.TabWidget"),
    ("table", "android.widget.TableLayout"),
    ("text", "android.widget.TextView"),
    ("textclock", "android.widget.TextClock"),
    ("textfield", "android.widget.EditText"),
    ("textswitcher", "android.widget.TextSwitcher"),
    ("texture", "android.view.TextureView"),
    ("timepicker", "android.widget.TimePicker"),
    ("toggle", "android.widget.ToggleButton"),
    ("twolinelistitem", "android.widget.TwoLineListItem"),
    ("video", "android.widget.VideoView"),
    ("view", "android.view.View"),
    ("viewanimator", "android.widget.ViewAnimator"),
    ("viewflipper", "android.widget.ViewFlipper"),
    ("viewgroup", "android.view.ViewGroup"),
    ("viewswitcher", "android.widget.ViewSwitcher"),
    ("web", "android.webkit.WebView"),
    ("window", "android.widget.FrameLayout"),
    ("zoom", "android.widget.ZoomButton"),
    ("zoomcontrols", "android.widget.ZoomControls"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMatch {
    /// `*`: any node.
    Any,
    Class(String),
}

/// Maps a tag (`button`, or a widget's simple name such as `TextView`) to
/// its widget class. Fully qualified and unknown tags are used as class names
/// unchanged.
pub fn match_tag(tag: &str) -> Result<TagMatch, LocatorError> {
    let tag = tag.trim();
    if tag == "*" {
        return Ok(TagMatch::Any);
    }
    let lower = tag.to_ascii_lowercase();
    if UNALLOWED.contains(&lower.as_str()) {
        return Err(LocatorError::invalid(format!(
            "Tag name '{tag}' is not supported"
        )));
    }
    if tag.is_empty() {
        return Err(LocatorError::invalid("Tag name must not be empty"));
    }
    let class = CLASS_MAP
        .iter()
        .find(|(name, _)| *name == lower)
        .or_else(|| CLASS_MAP.iter().find(|(_, class)| simple_name(class) == lower))
        .map(|(_, class)| (*class).to_string())
        .unwrap_or_else(|| tag.to_string());
    Ok(TagMatch::Class(class))
}

fn simple_name(class: &str) -> String {
    class.rsplit('.').next().unwrap_or(class).to_ascii_lowercase()
}
