//! HTML テンプレートの登録簿（handlebars）
//!
//! 起動時に一度だけ組み立て、以後は不変のまま `Arc` で共有する。
//! `{{name}}` は HTML エスケープされ、描画済みの断片は `{{{items}}}` で埋め込む。

use domain::Todo;
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

const INDEX_SOURCE: &str = include_str!("../views/index.html");
const ITEM_SOURCE: &str = include_str!("../views/todo_item.html");

const INDEX: &str = "index";
const ITEM: &str = "todo-item";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template compile error: {0}")]
    Compile(#[from] handlebars::TemplateError),

    #[error("template render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Serialize)]
struct ItemView<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    date: &'a str,
    done: bool,
    done_class: &'static str,
    checked: &'static str,
}

impl<'a> From<&'a Todo> for ItemView<'a> {
    fn from(todo: &'a Todo) -> Self {
        Self {
            id: todo.id.as_str(),
            title: &todo.title,
            description: &todo.description,
            date: &todo.date,
            done: todo.done,
            done_class: if todo.done { "done" } else { "" },
            checked: if todo.done { "checked" } else { "" },
        }
    }
}

#[derive(Serialize)]
struct IndexView {
    items: String,
    count: usize,
    remaining: usize,
}

/// 画面で使うテンプレート一式
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    /// 組み込みの `views/` からテンプレートを組み立てる
    pub fn new() -> Result<Self, TemplateError> {
        Self::from_sources(INDEX_SOURCE, ITEM_SOURCE)
    }

    pub fn from_sources(index: &str, item: &str) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        // 未定義の変数は空文字ではなく描画エラーにする
        registry.set_strict_mode(true);
        registry.register_template_string(INDEX, index)?;
        registry.register_template_string(ITEM, item)?;
        Ok(Self { registry })
    }

    /// 1 件分の断片
    pub fn render_item(&self, todo: &Todo) -> Result<String, TemplateError> {
        Ok(self.registry.render(ITEM, &ItemView::from(todo))?)
    }

    /// ページ全体。並び順は呼び出し側で決めておく。
    pub fn render_index(&self, todos: &[Todo]) -> Result<String, TemplateError> {
        let items = todos
            .iter()
            .map(|todo| self.render_item(todo))
            .collect::<Result<Vec<_>, _>>()?
            .concat();

        let view = IndexView {
            items,
            count: todos.len(),
            remaining: todos.iter().filter(|t| !t.done).count(),
        };
        Ok(self.registry.render(INDEX, &view)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::TodoId;

    fn todo(id: &str, title: &str, done: bool) -> Todo {
        Todo {
            id: TodoId::from(id),
            title: title.to_string(),
            description: String::new(),
            done,
            date: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn builtin_templates_compile() {
        assert!(Templates::new().is_ok());
    }

    #[test]
    fn malformed_template_fails_to_compile() {
        let err = Templates::from_sources("{{#if done}}never closed", ITEM_SOURCE)
            .err()
            .unwrap();
        assert!(matches!(err, TemplateError::Compile(_)));
    }

    #[test]
    fn missing_variable_is_a_render_error() {
        let templates = Templates::from_sources("<p>{{nope}}</p>", ITEM_SOURCE).unwrap();
        assert!(matches!(
            templates.render_index(&[]),
            Err(TemplateError::Render(_))
        ));
    }

    #[test]
    fn item_fragment_escapes_user_text() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render_item(&todo("7", "<script>alert(1)</script>", true))
            .unwrap();

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("data-id=\"7\""));
        assert!(html.contains("data-done=\"true\""));
        assert!(html.contains("checked"));
    }

    #[test]
    fn index_embeds_items_unescaped_in_given_order() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render_index(&[todo("2", "second", false), todo("1", "first", true)])
            .unwrap();

        assert!(html.contains("<li class=\"todo-item"));
        let second = html.find("second").unwrap();
        let first = html.find("first").unwrap();
        assert!(second < first);
        assert!(html.contains("<span id=\"remaining\">1</span> open / 2 total"));
    }
}
