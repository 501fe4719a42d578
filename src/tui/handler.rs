use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{InputMode, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    Select,
    Back,
    SwitchPane,
    Reload,
    AddArticle,
    RemoveArticle,
    GenerateSnippet,
    SetCoverArticle,
    CycleCoverImage,
    CycleCategoryFilter,
    CycleSort,
    CycleImageModel,
    CycleStatus,
    CopyExport,
    OpenInBrowser,
    ShowHelp,
    HideHelp,
    // Prompts
    StartSearch,
    StartNewNewsletter,
    StartCategory,
    StartCoverPrompt,
    StartPublishDate,
    StartTitle,
    StartIntro,
    StartHeadline,
    InputChar(char),
    InputBackspace,
    InputConfirm,
    InputCancel,
}

pub fn handle_key_event(
    key: KeyEvent,
    view: View,
    input_mode: InputMode,
    show_help: bool,
) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    if input_mode != InputMode::None {
        return match key.code {
            KeyCode::Enter => Some(AppAction::InputConfirm),
            KeyCode::Esc => Some(AppAction::InputCancel),
            KeyCode::Backspace => Some(AppAction::InputBackspace),
            KeyCode::Char(c) => Some(AppAction::InputChar(c)),
            _ => None,
        };
    }

    // Keys shared by both views
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => return Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Some(AppAction::Quit),

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => return Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => return Some(AppAction::MoveUp),
        (KeyCode::Char('<'), _) => return Some(AppAction::MoveToTop),
        (KeyCode::Char('>'), _) => return Some(AppAction::MoveToBottom),

        (KeyCode::Enter, _) => return Some(AppAction::Select),
        (KeyCode::Char('r'), _) => return Some(AppAction::Reload),
        (KeyCode::Char('S'), _) => return Some(AppAction::CycleStatus),
        (KeyCode::Char('p'), _) => return Some(AppAction::StartPublishDate),
        (KeyCode::Char('t'), _) => return Some(AppAction::StartTitle),
        (KeyCode::Char('T'), _) => return Some(AppAction::StartIntro),

        (KeyCode::Char('?'), _) => return Some(AppAction::ShowHelp),
        _ => {}
    }

    match view {
        View::Newsletters => match key.code {
            KeyCode::Char('n') => Some(AppAction::StartNewNewsletter),
            KeyCode::Char('l') | KeyCode::Right => Some(AppAction::Select),
            _ => None,
        },
        View::Curate => match key.code {
            KeyCode::Esc | KeyCode::Backspace => Some(AppAction::Back),
            KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => Some(AppAction::SwitchPane),
            KeyCode::Left | KeyCode::Right => Some(AppAction::SwitchPane),

            KeyCode::Char('a') => Some(AppAction::AddArticle),
            KeyCode::Char('x') | KeyCode::Char('d') => Some(AppAction::RemoveArticle),
            KeyCode::Char('c') => Some(AppAction::StartCategory),
            KeyCode::Char('e') => Some(AppAction::StartHeadline),
            KeyCode::Char('g') => Some(AppAction::GenerateSnippet),
            KeyCode::Char('v') => Some(AppAction::SetCoverArticle),

            KeyCode::Char('/') => Some(AppAction::StartSearch),
            KeyCode::Char('f') => Some(AppAction::CycleCategoryFilter),
            KeyCode::Char('s') => Some(AppAction::CycleSort),

            KeyCode::Char('i') => Some(AppAction::StartCoverPrompt),
            KeyCode::Char('I') => Some(AppAction::CycleCoverImage),
            KeyCode::Char('m') => Some(AppAction::CycleImageModel),

            KeyCode::Char('y') => Some(AppAction::CopyExport),
            KeyCode::Char('o') => Some(AppAction::OpenInBrowser),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_help_swallows_keys() {
        let action = handle_key_event(key(KeyCode::Char('q')), View::Curate, InputMode::None, true);
        assert_eq!(action, Some(AppAction::HideHelp));
    }

    #[test]
    fn test_input_mode_captures_characters() {
        let action = handle_key_event(key(KeyCode::Char('q')), View::Curate, InputMode::Search, false);
        assert_eq!(action, Some(AppAction::InputChar('q')));

        let action = handle_key_event(key(KeyCode::Esc), View::Curate, InputMode::Category, false);
        assert_eq!(action, Some(AppAction::InputCancel));

        let action = handle_key_event(key(KeyCode::Enter), View::Newsletters, InputMode::Title, false);
        assert_eq!(action, Some(AppAction::InputConfirm));
    }

    #[test]
    fn test_curation_keys_only_in_curate_view() {
        let add = key(KeyCode::Char('a'));
        assert_eq!(
            handle_key_event(add, View::Curate, InputMode::None, false),
            Some(AppAction::AddArticle)
        );
        assert_eq!(handle_key_event(add, View::Newsletters, InputMode::None, false), None);

        let new = key(KeyCode::Char('n'));
        assert_eq!(
            handle_key_event(new, View::Newsletters, InputMode::None, false),
            Some(AppAction::StartNewNewsletter)
        );
    }

    #[test]
    fn test_ctrl_c_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            handle_key_event(ctrl_c, View::Curate, InputMode::None, false),
            Some(AppAction::Quit)
        );
        // plain 'c' edits the category
        assert_eq!(
            handle_key_event(key(KeyCode::Char('c')), View::Curate, InputMode::None, false),
            Some(AppAction::StartCategory)
        );
    }
}
