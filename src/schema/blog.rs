//! Field metadata for the blog categories.
//!
//! Every object has an `id` field which identifies it within its category.
//! For `users` the id is supplied externally on create; for `articles` and
//! `comments` it is forbidden on create and generated internally.

use super::checks::{
    is_email, is_non_empty_array, is_role_list, is_timestamp, now_timestamp, to_timestamp, ROLES,
};
use super::types::{Action, CategoryDefinition, FieldDefinition, Relation};
use crate::constants::{CREATION_TIME_FIELD, ID_FIELD, UPDATE_TIME_FIELD};

use Action::{Create, Find, Remove, Update};

pub const USERS: &str = "users";
pub const ARTICLES: &str = "articles";
pub const COMMENTS: &str = "comments";

/// The full users/articles/comments metadata table.
pub fn blog_schema() -> Vec<CategoryDefinition> {
    vec![users(), articles(), comments()]
}

fn users() -> CategoryDefinition {
    CategoryDefinition::new(
        USERS,
        vec![
            FieldDefinition::new(ID_FIELD, "user ID").required(&[Create, Update, Remove]),
            FieldDefinition::new("email", "user email")
                .check(is_email, "the user email fields must be of the form id@domain")
                .required(&[Create])
                .forbidden(&[Remove])
                .indexed(),
            FieldDefinition::new("firstName", "user first name")
                .required(&[Create])
                .forbidden(&[Remove])
                .indexed(),
            FieldDefinition::new("lastName", "user last name")
                .required(&[Create])
                .forbidden(&[Remove])
                .indexed(),
            FieldDefinition::new("roles", "user roles")
                .check(
                    is_role_list,
                    format!("the user roles field must be an array of {}", ROLES.join(", ")),
                )
                .required(&[Create])
                .forbidden(&[Find, Remove]),
            creation_time("user"),
            update_time("user"),
        ],
    )
}

fn articles() -> CategoryDefinition {
    CategoryDefinition::new(
        ARTICLES,
        vec![
            FieldDefinition::new(ID_FIELD, "article ID")
                .required(&[Update, Remove])
                .forbidden(&[Create]),
            FieldDefinition::new("title", "article title")
                .required(&[Create])
                .forbidden(&[Find, Remove]),
            FieldDefinition::new("content", "article content")
                .required(&[Create])
                .forbidden(&[Find, Remove]),
            FieldDefinition::new("authorId", "author ID")
                .required(&[Create])
                .forbidden(&[Update, Remove])
                .identifies(USERS)
                .indexed(),
            creation_time("article"),
            update_time("article"),
            FieldDefinition::new("keywords", "article keywords")
                .check(is_non_empty_array, "article keywords must be a non-empty array")
                .required(&[Create])
                .forbidden(&[Remove])
                .relation(Relation::ArrayContainsAll)
                .indexed(),
        ],
    )
}

fn comments() -> CategoryDefinition {
    CategoryDefinition::new(
        COMMENTS,
        vec![
            FieldDefinition::new(ID_FIELD, "comment ID")
                .required(&[Update, Remove])
                .forbidden(&[Create]),
            FieldDefinition::new("content", "comment content")
                .required(&[Create])
                .forbidden(&[Find, Remove]),
            FieldDefinition::new("articleId", "comment article ID")
                .required(&[Create])
                .forbidden(&[Update, Remove])
                .identifies(ARTICLES)
                .indexed(),
            FieldDefinition::new("commenterId", "commenter ID")
                .required(&[Create])
                .forbidden(&[Update, Remove])
                .identifies(USERS)
                .indexed(),
            creation_time("comment"),
            update_time("comment"),
        ],
    )
}

fn creation_time(owner: &str) -> FieldDefinition {
    FieldDefinition::new(CREATION_TIME_FIELD, format!("{} creation time", owner))
        .check(
            is_timestamp,
            format!("the {} creation time must be a valid ISO-8601 date-time", owner),
        )
        .transform(to_timestamp)
        .forbidden(&[Update, Remove])
        .default_with(now_timestamp)
        .relation(Relation::AtMostSearchValue)
        .indexed()
}

fn update_time(owner: &str) -> FieldDefinition {
    FieldDefinition::new(UPDATE_TIME_FIELD, format!("{} update time", owner))
        .check(
            is_timestamp,
            format!("the {} update time must be a valid ISO-8601 date-time", owner),
        )
        .transform(to_timestamp)
        .forbidden(&[Find, Remove])
        .default_with(now_timestamp)
}
