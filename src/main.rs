use std::{path::PathBuf, sync::Mutex};

use anyhow::{bail, Context as _};
use clap::{command, Arg, ArgAction, ArgMatches, Command};
use context::Context;
use log::info;

use crate::{
    cache::{LinkMetaCache, LinkMetaFetcher, OfflineFetcher, WebpageFetcher},
    config::SiteConfig,
    generator::{generate, render_article_page, RenderedPage},
    images::ImageRegistry,
    loader::{BundleSource, ContentSource, FsSource},
    manifest::Manifest,
    renderer::generate_renderer,
};

mod article;
mod cache;
mod config;
mod context;
mod error;
mod front_matter;
mod generator;
mod images;
mod loader;
mod manifest;
mod metadata;
mod renderer;
mod transform;

fn path_arg(
    name: &'static str,
    long: &'static str,
    help: &'static str,
    default: &'static str,
) -> Arg {
    Arg::new(name)
        .long(long)
        .help(help)
        .value_parser(clap::value_parser!(PathBuf))
        .default_value(default)
        .global(true)
}

fn cli() -> Command {
    command!()
        .args([
            path_arg(
                "content_dir",
                "content-dir",
                "Directory of markdown articles. May be repeated.",
                "content/thoughts",
            )
            .action(ArgAction::Append),
            path_arg(
                "images_dir",
                "images-dir",
                "Directory of article images.",
                "content/thoughts/images",
            ),
            path_arg(
                "out_dir",
                "out-dir",
                "Directory path of output. Existing contents will be removed.",
                "out",
            ),
            path_arg(
                "public_dir",
                "public-dir",
                "Directory path of public. Contents will be copied as it is.",
                "public",
            ),
            path_arg("template_dir", "template-dir", "Directory of template", "template"),
            path_arg("site_config", "site-config", "Site configuration (JSON).", "site.json"),
            path_arg(
                "manifest",
                "manifest",
                "Build-time manifest of articles and images.",
                "manifest.json",
            ),
            path_arg("cache", "cache", "Link metadata cache file.", "cache.json"),
            Arg::new("source")
                .long("source")
                .help("Where articles are read from")
                .value_parser(["fs", "bundle"])
                .default_value("fs")
                .global(true),
            Arg::new("offline")
                .long("offline")
                .help("Do not fetch link metadata; use the cache only")
                .action(ArgAction::SetTrue)
                .global(true),
        ])
        .subcommand(Command::new("build").about("Render the whole site (default)"))
        .subcommand(Command::new("list").about("Print every article slug"))
        .subcommand(
            Command::new("page")
                .about("Render a single article page to stdout")
                .arg(Arg::new("slug").required(true)),
        )
        .subcommand(Command::new("manifest").about("Scan content and write the manifest"))
}

fn path(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing --{}", name.replace('_', "-")))
}

fn content_dirs(args: &ArgMatches) -> Vec<PathBuf> {
    args.get_many::<PathBuf>("content_dir")
        .map(|dirs| dirs.cloned().collect())
        .unwrap_or_default()
}

fn open_source(
    args: &ArgMatches,
    site: &SiteConfig,
) -> anyhow::Result<(Box<dyn ContentSource>, ImageRegistry)> {
    match args.get_one::<String>("source").map(String::as_str) {
        Some("bundle") => {
            let manifest_path = path(args, "manifest")?;
            let manifest = Manifest::load(&manifest_path)?;
            let source = BundleSource::from_manifest(&manifest)?;
            Ok((Box::new(source), manifest.registry()))
        }
        _ => {
            let registry = ImageRegistry::scan(&path(args, "images_dir")?, &site.image_url_prefix)?;
            info!("Registered {} images", registry.len());
            Ok((Box::new(FsSource::new(content_dirs(args))), registry))
        }
    }
}

fn build_context(args: &ArgMatches, site: SiteConfig) -> anyhow::Result<Context> {
    let out_dir = path(args, "out_dir")?;
    if out_dir.exists() && !out_dir.is_dir() {
        bail!("if out_dir exists, it must be directory.");
    }
    let template_dir = path(args, "template_dir")?;
    if !template_dir.is_dir() {
        bail!("template_dir must be a directory.")
    }

    let fetcher: Box<dyn LinkMetaFetcher> = if args.get_flag("offline") {
        Box::new(OfflineFetcher)
    } else {
        Box::new(WebpageFetcher)
    };

    Ok(Context {
        out_dir,
        public_dir: path(args, "public_dir")?,
        images_dir: path(args, "images_dir")?,
        site,
        handlebars: generate_renderer(&template_dir)?,
        link_cache: Mutex::new(LinkMetaCache::load(&path(args, "cache")?)?),
        fetcher,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    let (command, args) = matches.subcommand().unwrap_or(("build", &matches));

    let site = SiteConfig::load(&path(args, "site_config")?)?;

    if command == "manifest" {
        let manifest = Manifest::scan(
            &content_dirs(args),
            &path(args, "images_dir")?,
            &site.image_url_prefix,
        )?;
        let manifest_path = path(args, "manifest")?;
        manifest.save(&manifest_path)?;
        info!(
            "Wrote {manifest_path:?} ({} articles, {} images)",
            manifest.articles.len(),
            manifest.images.len()
        );
        return Ok(());
    }

    let (source, registry) = open_source(args, &site)?;

    if command == "list" {
        for slug in source.slugs()? {
            println!("{slug}");
        }
        return Ok(());
    }

    let ctx = build_context(args, site)?;
    match command {
        "page" => {
            let slug = args.get_one::<String>("slug").context("missing slug")?;
            match render_article_page(&ctx, source.as_ref(), &registry, slug)? {
                RenderedPage::Article(html) | RenderedPage::NotFound(html) => println!("{html}"),
            }
        }
        _ => generate(&ctx, source.as_ref(), &registry)?,
    }

    // save cache
    let cache = ctx.link_cache();
    info!("Saving {} cached links", cache.len());
    cache.save(&path(args, "cache")?)?;

    Ok(())
}
