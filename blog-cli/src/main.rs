use blog_client::{BlogClientHttp, NewGroup, NewPost, Page, Post};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "blog", about = "Command-line client for the blog server")]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in with a username or an email address.
    Login {
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show a page of posts: everything, a group, a profile or the people you follow.
    Feed {
        #[arg(long, conflicts_with_all = ["profile", "following"])]
        group: Option<String>,
        #[arg(long, conflicts_with = "following")]
        profile: Option<String>,
        #[arg(long)]
        following: bool,
        #[arg(long)]
        page: Option<i64>,
    },
    Show {
        id: Uuid,
    },
    CreatePost(PostArgs),
    EditPost {
        id: Uuid,
        #[command(flatten)]
        post: PostArgs,
    },
    DeletePost {
        id: Uuid,
    },
    Comment {
        post_id: Uuid,
        #[arg(long)]
        text: String,
    },
    Follow {
        username: String,
    },
    Unfollow {
        username: String,
    },
    Groups,
    CreateGroup {
        #[arg(long)]
        title: String,
        #[arg(long)]
        slug: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    DeleteGroup {
        slug: String,
    },
    ClearCache,
}

#[derive(Args, Debug)]
struct PostArgs {
    #[arg(long)]
    text: String,
    #[arg(long)]
    group: Option<Uuid>,
    #[arg(long)]
    image: Option<String>,
}

impl From<PostArgs> for NewPost {
    fn from(args: PostArgs) -> Self {
        NewPost {
            text: args.text,
            group_id: args.group,
            image: args.image,
        }
    }
}

fn print_page(page: &Page<Post>) {
    println!(
        "Page {}/{} ({} posts)",
        page.number, page.num_pages, page.total
    );
    for post in &page.items {
        println!("\n{post}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    let mut client = BlogClientHttp::connect(&args.server).await?;

    match args.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = client.register(&username, &email, &password).await?;
            println!("Registered as {}", user.username);
        }
        Command::Login { login, password } => {
            let user = client.login(&login, &password).await?;
            println!("Logged in as {}", user.username);
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Command::Feed {
            group,
            profile,
            following,
            page,
        } => {
            if let Some(slug) = group {
                let feed = client.group_posts(&slug, page).await?;
                println!("{} ({})\n{}\n", feed.group.title, feed.group.slug, feed.group.description);
                print_page(&feed.page);
            } else if let Some(username) = profile {
                let feed = client.profile_posts(&username, page).await?;
                let marker = if feed.following { " [following]" } else { "" };
                println!("{}{}\n", feed.author.username, marker);
                print_page(&feed.page);
            } else if following {
                print_page(&client.follow_posts(page).await?);
            } else {
                print_page(&client.list_posts(page).await?);
            }
        }
        Command::Show { id } => {
            let detail = client.get_post(id).await?;
            println!("{}", detail.post);
            println!("\nComments ({})", detail.comments.len());
            for comment in detail.comments {
                println!("- {} {}: {}", comment.created_at, comment.author_id, comment.text);
            }
        }
        Command::CreatePost(post) => {
            let post = client.create_post(&post.into()).await?;
            println!("Post created! ID: {}", post.id);
        }
        Command::EditPost { id, post } => {
            let post = client.update_post(id, &post.into()).await?;
            println!("{post}");
        }
        Command::DeletePost { id } => {
            client.delete_post(id).await?;
            println!("Post deleted!");
        }
        Command::Comment { post_id, text } => {
            let comment = client.add_comment(post_id, &text).await?;
            println!("Comment added! ID: {}", comment.id);
        }
        Command::Follow { username } => {
            let resp = client.follow(&username).await?;
            if resp.following {
                println!("Following {}", resp.author.username);
            } else {
                println!("Not following {}", resp.author.username);
            }
        }
        Command::Unfollow { username } => {
            let resp = client.unfollow(&username).await?;
            println!("Unfollowed {}", resp.author.username);
        }
        Command::Groups => {
            for group in client.list_groups().await? {
                println!("{}  {}  {}", group.slug, group.title, group.id);
            }
        }
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            let group = client
                .create_group(&NewGroup {
                    title,
                    slug,
                    description,
                })
                .await?;
            println!("Group created! ID: {}", group.id);
        }
        Command::DeleteGroup { slug } => {
            client.delete_group(&slug).await?;
            println!("Group deleted!");
        }
        Command::ClearCache => {
            client.clear_cache().await?;
            println!("Cache cleared");
        }
    }

    Ok(())
}
