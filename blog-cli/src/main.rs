use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use blog_client::{
    BlogClient, CategoryForm, ContactClient, ContactForm, DetailView, FormState, Link,
    ListView, LoginForm, PostForm, Session, SignupForm, StorageClient, TOKEN_FILE,
};
use blog_core::{Category, CategoryId, Post, PostId, ThumbnailPolicy};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Parser, Debug)]
struct Cli {
    #[clap(short, long, env = "BLOG_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    #[clap(long, env = "CONTACT_WEBHOOK_URL")]
    contact_webhook: Option<String>,

    #[clap(long, default_value = TOKEN_FILE)]
    token_file: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    Signup {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    Login {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    Logout,
    /// Public posts.
    Posts {
        #[clap(subcommand)]
        command: PostsCommand,
    },
    /// Admin area, requires `login` first.
    Admin {
        #[clap(subcommand)]
        command: AdminCommand,
    },
    /// Prints the public URL of a stored thumbnail key.
    ThumbnailUrl { key: String },
    Contact {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        message: String,
    },
}

#[derive(Parser, Debug)]
enum PostsCommand {
    List,
    Show { id: PostId },
}

#[derive(Parser, Debug)]
enum AdminCommand {
    Posts {
        #[clap(subcommand)]
        command: AdminPostsCommand,
    },
    Categories {
        #[clap(subcommand)]
        command: AdminCategoriesCommand,
    },
}

#[derive(Parser, Debug)]
enum AdminPostsCommand {
    List,
    Show {
        id: PostId,
    },
    Create {
        #[clap(long)]
        title: String,
        #[clap(long)]
        content: String,
        #[clap(long = "category")]
        categories: Vec<CategoryId>,
        #[clap(long)]
        thumbnail: Option<PathBuf>,
        #[clap(long)]
        require_thumbnail: bool,
    },
    Update {
        id: PostId,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        content: Option<String>,
        #[clap(long = "category")]
        categories: Vec<CategoryId>,
        #[clap(long)]
        thumbnail: Option<PathBuf>,
    },
    Delete {
        id: PostId,
        #[clap(long)]
        yes: bool,
    },
}

#[derive(Parser, Debug)]
enum AdminCategoriesCommand {
    List,
    Show {
        id: CategoryId,
    },
    Create {
        #[clap(long)]
        name: String,
    },
    Update {
        id: CategoryId,
        #[clap(long)]
        name: String,
    },
    Delete {
        id: CategoryId,
        #[clap(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> CliResult {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Cli::parse();
    debug!(server = %args.server, token_file = %args.token_file.display(), "starting");
    let client = BlogClient::connect(&args.server)?;
    let storage = StorageClient::new(client.api());

    match args.command {
        Command::Signup { email, password } => {
            let mut form = SignupForm::new();
            form.values.email = email;
            form.values.password = password;
            report(form.submit(&client).await)?;
        }
        Command::Login { email, password } => {
            let mut form = LoginForm::new();
            form.values.email = email;
            form.values.password = password;
            let session = form.submit(&client).await;
            report(form.state())?;
            if let Some(session) = session {
                session.save(&args.token_file)?;
            }
        }
        Command::Logout => {
            Session::clear(&args.token_file)?;
            println!("Logged out.");
        }
        Command::Posts { command } => match command {
            PostsCommand::List => {
                let view = blog_client::pages::home(&client).await;
                print_list(&view, "No posts yet.", post_line)?;
            }
            PostsCommand::Show { id } => {
                let view = blog_client::pages::post_detail(&client, id).await;
                print_post(loaded(view, "Post")?, &storage);
            }
        },
        Command::Admin { command } => {
            let session = Session::load(&args.token_file)?;
            if !session.is_authenticated() {
                return Err("not logged in, run `login` first".into());
            }
            admin(&client, &storage, &session, command).await?;
        }
        Command::ThumbnailUrl { key } => match storage.resolve(Some(&key)) {
            Some(url) => println!("{url}"),
            None => return Err("thumbnail key is empty".into()),
        },
        Command::Contact {
            name,
            email,
            message,
        } => {
            let webhook = args
                .contact_webhook
                .ok_or("no contact webhook configured, set CONTACT_WEBHOOK_URL")?;
            let contact = ContactClient::new(webhook)?;
            let mut form = ContactForm::new();
            form.values.name = name;
            form.values.email = email;
            form.values.message = message;
            report(form.submit(&contact).await)?;
        }
    }

    Ok(())
}

async fn admin(
    client: &BlogClient,
    storage: &StorageClient,
    session: &Session,
    command: AdminCommand,
) -> CliResult {
    match command {
        AdminCommand::Posts { command } => match command {
            AdminPostsCommand::List => {
                let view = blog_client::pages::admin_posts(client, session).await;
                print_list(&view, "No posts yet.", post_line)?;
            }
            AdminPostsCommand::Show { id } => {
                let mut form = PostForm::new();
                let view = blog_client::pages::edit_post(client, session, id, &mut form).await;
                print_post(loaded(view, "Post")?, storage);
            }
            AdminPostsCommand::Create {
                title,
                content,
                categories,
                thumbnail,
                require_thumbnail,
            } => {
                let mut form = PostForm::new();
                if require_thumbnail {
                    form.thumbnail = ThumbnailPolicy::Required;
                }
                form.values.title = title;
                form.values.content = content;
                form.select_categories(categories);
                if let Some(path) = thumbnail {
                    attach(&mut form, storage, session, &path).await?;
                }
                report(form.submit_create(client, session).await)?;
            }
            AdminPostsCommand::Update {
                id,
                title,
                content,
                categories,
                thumbnail,
            } => {
                let mut form = PostForm::new();
                let view = blog_client::pages::edit_post(client, session, id, &mut form).await;
                loaded(view, "Post")?;
                if let Some(title) = title {
                    form.values.title = title;
                }
                if let Some(content) = content {
                    form.values.content = content;
                }
                if !categories.is_empty() {
                    form.select_categories(categories);
                }
                if let Some(path) = thumbnail {
                    attach(&mut form, storage, session, &path).await?;
                }
                report(form.submit_update(client, session, id).await)?;
            }
            AdminPostsCommand::Delete { id, yes } => {
                if !yes && !confirm(&format!("Delete post {id}?"))? {
                    return Ok(());
                }
                let mut form = PostForm::new();
                report(form.delete(client, session, id).await)?;
            }
        },
        AdminCommand::Categories { command } => match command {
            AdminCategoriesCommand::List => {
                let view = blog_client::pages::admin_categories(client, session).await;
                print_list(&view, "No categories yet.", category_line)?;
            }
            AdminCategoriesCommand::Show { id } => {
                let mut form = CategoryForm::new();
                let view =
                    blog_client::pages::edit_category(client, session, id, &mut form).await;
                let category = loaded(view, "Category")?;
                println!("{}", category_line(&category));
            }
            AdminCategoriesCommand::Create { name } => {
                let mut form = CategoryForm::new();
                form.values.name = name;
                report(form.submit_create(client, session).await)?;
            }
            AdminCategoriesCommand::Update { id, name } => {
                let mut form = CategoryForm::new();
                let view =
                    blog_client::pages::edit_category(client, session, id, &mut form).await;
                loaded(view, "Category")?;
                form.values.name = name;
                report(form.submit_update(client, session, id).await)?;
            }
            AdminCategoriesCommand::Delete { id, yes } => {
                if !yes && !confirm(&format!("Delete category {id}?"))? {
                    return Ok(());
                }
                let mut form = CategoryForm::new();
                report(form.delete(client, session, id).await)?;
            }
        },
    }
    Ok(())
}

async fn attach(
    form: &mut PostForm,
    storage: &StorageClient,
    session: &Session,
    path: &Path,
) -> CliResult {
    let key = form.attach_thumbnail_file(storage, session, path).await?;
    println!("Uploaded thumbnail: {key}");
    Ok(())
}

/// Prints the outcome of a submit; a blocked or failed submit is an error.
fn report(state: &FormState) -> CliResult {
    match state {
        FormState::Invalid(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("  {field}: {message}");
            }
            Err("the form has errors".into())
        }
        FormState::Failed(alert) => Err(alert.clone().into()),
        FormState::Done { notice, route } => {
            println!("{notice}");
            if let Some(route) = route {
                println!("-> {route}");
            }
            Ok(())
        }
        FormState::Idle | FormState::Submitting => Ok(()),
    }
}

fn loaded<T>(view: DetailView<T>, what: &str) -> Result<T, Box<dyn std::error::Error>> {
    match view {
        DetailView::Loaded(item) => Ok(item),
        DetailView::NotFound => Err(format!("{what} not found.").into()),
        DetailView::Failed(msg) => Err(msg.into()),
        DetailView::Loading => Err(format!("{what} is still loading.").into()),
    }
}

fn print_list<T>(
    view: &ListView<Link<T>>,
    empty: &str,
    line: impl Fn(&T) -> String,
) -> CliResult {
    match view {
        ListView::Loaded(links) => {
            for link in links {
                println!("{}  ({})", line(&link.item), link.route);
            }
            Ok(())
        }
        ListView::Empty => {
            println!("{empty}");
            Ok(())
        }
        ListView::Failed(msg) => Err(msg.clone().into()),
        ListView::Loading => Ok(()),
    }
}

fn post_line(post: &Post) -> String {
    format!(
        "- [{}] {} {} [{}]",
        post.id,
        post.created_at.format("%Y/%m/%d"),
        post.title,
        post.category_names().join(", ")
    )
}

fn category_line(category: &Category) -> String {
    format!("- [{}] {}", category.id, category.name)
}

fn print_post(post: Post, storage: &StorageClient) {
    println!("{}", post.title);
    println!("{}", post.created_at.format("%Y/%m/%d"));
    println!("Categories: {}", post.category_names().join(", "));
    if let Some(url) = storage.resolve(post.thumbnail_image_key.as_deref()) {
        println!("Thumbnail: {url}");
    }
    println!();
    println!("{}", post.content);
}

fn confirm(question: &str) -> Result<bool, io::Error> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
