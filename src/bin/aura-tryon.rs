use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aura_tryon::{
    CaptureDevice, CartManager, Catalog, DefaultImageLoader, ImageSource, JsonFileStore,
    KeyValueStore, LiveTryOnView, Notifier, OverlaySelector, StaticCompositor,
    StillCaptureDevice, TracingNotifier, TryOnConfig, TryOnView, WishlistManager,
};

#[derive(Parser, Debug)]
#[command(name = "aura-tryon", version)]
struct Cli {
    /// Engine config JSON (placement, style, capture, download prefix, storage dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Product catalog JSON. Defaults to the built-in catalog.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Overlay a clothing image on a person photo and write the PNG.
    Compose(ComposeArgs),
    /// Run the live overlay for a while and save a snapshot.
    Live(LiveArgs),
    /// List catalog products.
    Catalog {
        /// Only show this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Inspect or change the stored cart.
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Inspect or change the stored wishlist.
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Person photo (path, data: URI or URL).
    #[arg(long)]
    person: String,

    /// Clothing image (path, data: URI or URL).
    #[arg(long)]
    clothing: String,

    /// Output directory.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct LiveArgs {
    /// Replay this image as the camera feed instead of opening a real camera.
    #[arg(long)]
    still: Option<PathBuf>,

    /// Catalog product to overlay.
    #[arg(long, conflicts_with = "overlay")]
    product: Option<String>,

    /// Local image to overlay.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// How long to stream before taking the snapshot (0 to 3600).
    #[arg(long, default_value_t = 2.0, value_parser = parse_seconds)]
    seconds: f64,

    /// Output directory for the snapshot.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Also add the selected product to the cart.
    #[arg(long)]
    add_to_cart: bool,

    /// Also add the selected product to the wishlist.
    #[arg(long)]
    add_to_wishlist: bool,
}

#[derive(Subcommand, Debug)]
enum CartAction {
    Show,
    Add { product_id: String },
    Remove { product_id: String },
    Set { product_id: String, quantity: i64 },
    Clear,
}

#[derive(Subcommand, Debug)]
enum WishlistAction {
    Show,
    Add { product_id: String },
    Remove { product_id: String },
}

fn parse_seconds(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || !(0.0..=3600.0).contains(&secs) {
        return Err(format!("expected seconds between 0 and 3600, got {raw}"));
    }
    Ok(secs)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => TryOnConfig::load(path)?,
        None => TryOnConfig::default(),
    };
    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_json_file(path)?,
        None => Catalog::builtin(),
    };

    match cli.cmd {
        Command::Compose(args) => cmd_compose(&config, args),
        Command::Live(args) => cmd_live(&config, catalog, args),
        Command::Catalog { category } => cmd_catalog(&catalog, category.as_deref()),
        Command::Cart { action } => cmd_cart(&config, &catalog, action),
        Command::Wishlist { action } => cmd_wishlist(&config, &catalog, action),
    }
}

fn notifier() -> Arc<dyn Notifier> {
    Arc::new(TracingNotifier)
}

fn store(config: &TryOnConfig) -> Arc<dyn KeyValueStore> {
    Arc::new(JsonFileStore::new(&config.storage_dir))
}

fn product<'a>(catalog: &'a Catalog, id: &str) -> anyhow::Result<&'a aura_tryon::Product> {
    catalog
        .get(id)
        .with_context(|| format!("unknown product '{id}'"))
}

fn cmd_compose(config: &TryOnConfig, args: ComposeArgs) -> anyhow::Result<()> {
    let compositor = StaticCompositor::new(config.placement, config.style.clone())?;
    let mut view = TryOnView::new(compositor, notifier())
        .with_download_prefix(config.download_prefix.clone());
    view.set_person(ImageSource::parse(&args.person));
    view.set_clothing(ImageSource::parse(&args.clothing));
    view.generate_preview()?;
    let path = view.download(&args.out_dir, chrono::Utc::now())?;
    println!("{}", path.display());
    Ok(())
}

fn open_device(still: Option<&Path>) -> anyhow::Result<Arc<dyn CaptureDevice>> {
    if let Some(path) = still {
        let bytes =
            std::fs::read(path).with_context(|| format!("read still '{}'", path.display()))?;
        return Ok(Arc::new(StillCaptureDevice::from_encoded(&bytes)?));
    }
    camera_device()
}

#[cfg(feature = "media-ffmpeg")]
fn camera_device() -> anyhow::Result<Arc<dyn CaptureDevice>> {
    Ok(Arc::new(aura_tryon::FfmpegCaptureDevice::default()))
}

#[cfg(not(feature = "media-ffmpeg"))]
fn camera_device() -> anyhow::Result<Arc<dyn CaptureDevice>> {
    anyhow::bail!("no camera support in this build: pass --still or enable the 'media-ffmpeg' feature")
}

fn cmd_live(config: &TryOnConfig, catalog: Catalog, args: LiveArgs) -> anyhow::Result<()> {
    let device = open_device(args.still.as_deref())?;
    let notifier = notifier();
    let store = store(config);
    let selector =
        OverlaySelector::new(Arc::new(catalog)).with_loader(Arc::new(DefaultImageLoader::new()));
    let mut view = LiveTryOnView::new(
        device,
        selector,
        CartManager::load(Arc::clone(&store), Arc::clone(&notifier)),
        WishlistManager::load(store, Arc::clone(&notifier)),
        notifier,
        config,
    );

    if let Some(id) = &args.product {
        view.select_product(id)?;
    } else if let Some(path) = &args.overlay {
        let bytes =
            std::fs::read(path).with_context(|| format!("read overlay '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "overlay".to_string());
        view.upload_overlay(&name, &bytes)?;
    }

    view.start_camera()?;
    let run_for = Duration::try_from_secs_f64(args.seconds).context("invalid --seconds")?;
    let deadline = Instant::now() + run_for;
    while Instant::now() < deadline || view.renderer().stats().frames_rendered == 0 {
        if Instant::now() > deadline + Duration::from_secs(10) {
            anyhow::bail!("camera produced no frames");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    let path = view.snapshot_to(&args.out_dir, chrono::Utc::now())?;
    let stats = view.renderer().stats();
    view.stop_camera();

    if args.add_to_cart {
        view.add_selected_to_cart()?;
    }
    if args.add_to_wishlist {
        view.add_selected_to_wishlist()?;
    }

    eprintln!(
        "frames rendered: {}, skipped: {}",
        stats.frames_rendered, stats.steps_skipped
    );
    println!("{}", path.display());
    Ok(())
}

fn cmd_catalog(catalog: &Catalog, category: Option<&str>) -> anyhow::Result<()> {
    for p in catalog.products() {
        if category.is_some_and(|c| c != p.category) {
            continue;
        }
        println!("{:>4}  {:<28} {:>10}  {}", p.id, p.title, p.price.to_string(), p.category);
    }
    Ok(())
}

fn cmd_cart(config: &TryOnConfig, catalog: &Catalog, action: CartAction) -> anyhow::Result<()> {
    let mut cart = CartManager::load(store(config), notifier());
    match action {
        CartAction::Show => {}
        CartAction::Add { product_id } => cart.add_to_cart(product(catalog, &product_id)?)?,
        CartAction::Remove { product_id } => cart.remove_from_cart(&product_id)?,
        CartAction::Set {
            product_id,
            quantity,
        } => cart.update_quantity(&product_id, quantity)?,
        CartAction::Clear => cart.clear_cart()?,
    }
    for line in cart.items() {
        println!(
            "{:>4}  {:<28} x{:<3} {:>10}",
            line.product.id,
            line.product.title,
            line.quantity,
            line.line_total().to_string()
        );
    }
    println!("items: {}  total: {}", cart.item_count(), cart.total());
    Ok(())
}

fn cmd_wishlist(
    config: &TryOnConfig,
    catalog: &Catalog,
    action: WishlistAction,
) -> anyhow::Result<()> {
    let mut wishlist = WishlistManager::load(store(config), notifier());
    match action {
        WishlistAction::Show => {}
        WishlistAction::Add { product_id } => {
            wishlist.add_to_wishlist(product(catalog, &product_id)?)?;
        }
        WishlistAction::Remove { product_id } => wishlist.remove_from_wishlist(&product_id)?,
    }
    for item in wishlist.items() {
        println!(
            "{:>4}  {:<28} added {}",
            item.product.id,
            item.product.title,
            item.added_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
